//! The transaction boundary: the only way to change project data.

use crate::{Change, Draft, Namespace, ProjectData, StoreError, Transaction};
use log::{debug, warn};
use studio_data::{
    Asset, Breakpoint, Instance, ProjectSnapshot, Prop, StyleDecl, StyleSource,
    StyleSourceSelection,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Result of a successful transaction.
#[derive(Debug)]
pub struct Commit<T> {
    /// What the mutator returned.
    pub output: T,
    /// The change record, `None` when the mutator changed nothing.
    pub transaction: Option<Transaction>,
}

/// Holds the project containers and hands out committed change records.
#[derive(Debug, Default)]
pub struct Store {
    data: ProjectData,
    subscribers: Vec<UnboundedSender<Transaction>>,
}

impl Store {
    pub fn new(data: ProjectData) -> Self {
        Self {
            data,
            subscribers: Vec::new(),
        }
    }

    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Self {
        Self::new(ProjectData::from_snapshot(snapshot))
    }

    #[inline]
    pub const fn data(&self) -> &ProjectData {
        &self.data
    }

    /// Receive every transaction committed from now on, in commit order.
    pub fn subscribe(&mut self) -> UnboundedReceiver<Transaction> {
        let (sender, receiver) = unbounded_channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Run `mutator` against drafts of the containers it touches and commit
    /// them together.
    ///
    /// Containers are drafted lazily on first access. If the mutator returns
    /// an error nothing is committed and nobody is notified.
    ///
    /// # Errors
    /// [`StoreError::Aborted`] wrapping the mutator's error.
    pub fn transaction<T, F>(&mut self, mutator: F) -> Result<Commit<T>, StoreError>
    where
        F: FnOnce(&mut Tx<'_>) -> anyhow::Result<T>,
    {
        let mut tx = Tx::new(&self.data);
        let output = match mutator(&mut tx) {
            Ok(output) => output,
            Err(error) => {
                debug!("transaction aborted: {error:#}");
                return Err(StoreError::Aborted(error));
            }
        };
        let drafts = tx.drafts;
        let changes = drafts.commit(&mut self.data);
        if changes.is_empty() {
            return Ok(Commit {
                output,
                transaction: None,
            });
        }
        let transaction = Transaction::new(changes);
        debug!(
            "committed transaction {} ({} patches)",
            transaction.id,
            transaction.patch_count()
        );
        self.notify(&transaction);
        Ok(Commit {
            output,
            transaction: Some(transaction),
        })
    }

    fn notify(&mut self, transaction: &Transaction) {
        self.subscribers.retain(|subscriber| {
            let delivered = subscriber.send(transaction.clone()).is_ok();
            if !delivered {
                warn!("dropping closed store subscriber");
            }
            delivered
        });
    }
}

macro_rules! drafts {
    ($($field:ident: $value:ty => $namespace:expr),+ $(,)?) => {
        #[derive(Default)]
        struct Drafts {
            touched: Vec<Namespace>,
            $($field: Option<Draft<$value>>,)+
        }

        impl Drafts {
            /// Swap every non-empty draft into `data`, in first-touch order.
            fn commit(self, data: &mut ProjectData) -> Vec<Change> {
                let Self { touched, $($field,)+ } = self;
                let mut changes: Vec<Change> = Vec::new();
                $(
                    if let Some(draft) = $field {
                        let (entries, patches) = draft.into_parts();
                        if !patches.is_empty() {
                            data.$field.commit(entries);
                            changes.push(Change { namespace: $namespace, patches });
                        }
                    }
                )+
                changes.sort_by_key(|change| {
                    touched
                        .iter()
                        .position(|namespace| *namespace == change.namespace)
                });
                changes
            }
        }

        impl<'data> Tx<'data> {
            $(
                /// Draft of this container, created on first access.
                pub fn $field(&mut self) -> &mut Draft<$value> {
                    let Self { base, drafts } = self;
                    if drafts.$field.is_none() {
                        drafts.touched.push($namespace);
                    }
                    drafts
                        .$field
                        .get_or_insert_with(|| Draft::new($namespace, &base.$field))
                }
            )+
        }
    };
}

drafts! {
    instances: Instance => Namespace::Instances,
    props: Vec<Prop> => Namespace::Props,
    breakpoints: Breakpoint => Namespace::Breakpoints,
    styles: StyleDecl => Namespace::Styles,
    style_sources: StyleSource => Namespace::StyleSources,
    style_source_selections: StyleSourceSelection => Namespace::StyleSourceSelections,
    assets: Asset => Namespace::Assets,
}

/// Mutable access to the project inside [`Store::transaction`].
pub struct Tx<'data> {
    base: &'data ProjectData,
    drafts: Drafts,
}

impl<'data> Tx<'data> {
    fn new(base: &'data ProjectData) -> Self {
        Self {
            base,
            drafts: Drafts::default(),
        }
    }

    /// The committed state the transaction started from.
    #[inline]
    pub const fn base(&self) -> &'data ProjectData {
        self.base
    }
}
