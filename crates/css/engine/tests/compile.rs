use css_engine::{CompileError, CompilerOptions, CssArtifact, SelectorStrategy, StyleCompiler};
use css_values::{CssProperty, StyleValue, Unit};
use studio_data::{
    Breakpoint, Instance, InstanceChild, ProjectSnapshot, StyleDecl, StyleDeclKey, StyleSource,
};
use studio_store::Store;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn project() -> ProjectSnapshot {
    let mut snapshot = ProjectSnapshot::default();
    snapshot.insert_breakpoint(Breakpoint::base("base"));
    snapshot.insert_breakpoint(Breakpoint::max("tablet", 991));
    snapshot.insert_breakpoint(Breakpoint::max("mobile", 479));
    snapshot.insert_breakpoint(Breakpoint::min("desktop", 1440));
    snapshot.insert_instance(
        Instance::new("body", "Body").with_children([InstanceChild::id("card")]),
    );
    snapshot.insert_instance(Instance::new("card", "Box"));
    snapshot.insert_style_source(StyleSource::Local { id: "body-local".into() });
    snapshot.insert_style_source(StyleSource::Local { id: "card-local".into() });
    snapshot.insert_style_source(StyleSource::Token {
        id: "rounded".into(),
        name: "Rounded".into(),
    });
    snapshot.select_sources("body", ["body-local"]);
    snapshot.select_sources("card", ["rounded", "card-local"]);
    for decl in [
        StyleDecl::new("body-local", "base", "margin", StyleValue::px(0.0)),
        StyleDecl::new("rounded", "base", "border-radius", StyleValue::px(8.0)),
        StyleDecl::new("rounded", "base", "color", StyleValue::keyword("black")),
        StyleDecl::new("card-local", "base", "color", StyleValue::keyword("red")),
        StyleDecl::new("card-local", "mobile", "padding", StyleValue::unit(1.0, Unit::Rem)),
        StyleDecl::new("card-local", "tablet", "padding", StyleValue::px(24.0)),
        StyleDecl::new("card-local", "desktop", "max-width", StyleValue::px(1200.0)),
        StyleDecl::new("card-local", "base", "color", StyleValue::keyword("blue"))
            .with_state(":hover"),
    ] {
        snapshot.insert_style(decl);
    }
    snapshot
}

#[test]
fn full_stylesheet_layout() {
    init_logging();
    let snapshot = project();
    let mut compiler = StyleCompiler::new(CompilerOptions {
        selector: SelectorStrategy::Class,
    });
    let delta = compiler.compile(snapshot.view()).unwrap();
    assert!(delta.full);
    assert_eq!(
        delta.css_text,
        concat!(
            ".w-body {\n  margin: 0;\n}\n",
            ".w-card {\n  border-radius: 8px;\n  color: red;\n}\n",
            ".w-card:hover {\n  color: blue;\n}\n",
            "@media all and (max-width: 991px) {\n  .w-card {\n    padding: 24px;\n  }\n}\n",
            "@media all and (max-width: 479px) {\n  .w-card {\n    padding: 1rem;\n  }\n}\n",
            "@media all and (min-width: 1440px) {\n  .w-card {\n    max-width: 1200px;\n  }\n}\n",
        )
    );
}

#[test]
fn compiling_twice_is_byte_identical() {
    let snapshot = project();
    let mut first = StyleCompiler::default();
    let mut second = StyleCompiler::default();
    let one = first.compile(snapshot.view()).unwrap().css_text;
    let two = first.compile(snapshot.view()).unwrap().css_text;
    let three = second.compile(snapshot.clone().view()).unwrap().css_text;
    assert_eq!(one, two);
    assert_eq!(one, three);
}

#[test]
fn invalid_values_do_not_stop_the_document() {
    let mut snapshot = project();
    snapshot.insert_style(StyleDecl::new("card-local", "base", "width", StyleValue::invalid("10pz")));
    let css = StyleCompiler::default().compile(snapshot.view()).unwrap().css_text;
    assert!(!css.contains("width: 10pz"));
    assert!(css.contains("border-radius: 8px;"));
}

#[test]
fn a_second_base_breakpoint_is_rejected() {
    let mut snapshot = project();
    snapshot.insert_breakpoint(Breakpoint::base("other"));
    assert!(matches!(
        StyleCompiler::default().compile(snapshot.view()),
        Err(CompileError::Breakpoints(_))
    ));
}

#[test]
fn transactions_recompile_only_what_they_touch() {
    init_logging();
    let mut store = Store::from_snapshot(project());
    let mut compiler = StyleCompiler::default();
    compiler.compile(store.data().view()).unwrap();

    let commit = store
        .transaction(|tx| {
            let key = tx.set_local_style(
                "card",
                "mobile",
                None,
                &CssProperty::new("paddingTop"),
                StyleValue::px(2.0),
            )?;
            Ok(key)
        })
        .unwrap();
    let transaction = commit.transaction.unwrap();
    let delta = compiler
        .apply_transaction(store.data().view(), &transaction)
        .unwrap();

    assert!(!delta.full);
    assert_eq!(delta.upserted.len(), 1);
    assert_eq!(delta.upserted[0].instance_id, "card");
    assert_eq!(delta.upserted[0].breakpoint_id, "mobile");
    assert!(delta.removed.is_empty());

    let fresh = StyleCompiler::default()
        .compile(store.data().view())
        .unwrap()
        .css_text;
    assert_eq!(delta.css_text, fresh);
    assert!(fresh.contains("padding-top: 2px;"));
}

#[test]
fn removed_declarations_of_sources_with_colons_recompile_their_instances() {
    let mut snapshot = project();
    snapshot.insert_style_source(StyleSource::Token {
        id: "theme:dark".into(),
        name: "Dark".into(),
    });
    snapshot.select_sources("body", ["theme:dark", "body-local"]);
    let decl = StyleDecl::new("theme:dark", "base", "color", StyleValue::keyword("white"));
    let key: StyleDeclKey = decl.key();
    snapshot.insert_style(decl);

    let mut store = Store::from_snapshot(snapshot);
    let mut compiler = StyleCompiler::default();
    assert!(compiler
        .compile(store.data().view())
        .unwrap()
        .css_text
        .contains("color: white;"));

    let commit = store
        .transaction(|tx| Ok(tx.delete_style(&key)))
        .unwrap();
    let delta = compiler
        .apply_transaction(store.data().view(), &commit.transaction.unwrap())
        .unwrap();

    assert!(!delta.full);
    assert!(!delta.css_text.contains("color: white;"));
    let fresh = StyleCompiler::default()
        .compile(store.data().view())
        .unwrap()
        .css_text;
    assert_eq!(delta.css_text, fresh);
}

#[test]
fn deleting_an_instance_removes_its_rules() {
    let mut store = Store::from_snapshot(project());
    let mut compiler = StyleCompiler::default();
    compiler.compile(store.data().view()).unwrap();

    let commit = store
        .transaction(|tx| Ok(tx.delete_instance("card")?))
        .unwrap();
    let delta = compiler
        .apply_transaction(store.data().view(), &commit.transaction.unwrap())
        .unwrap();
    assert_eq!(delta.removed.len(), 5);
    assert!(!delta.css_text.contains("card"));
    assert!(delta.css_text.contains("margin: 0;"));
}

#[test]
fn breakpoint_changes_rebuild_everything() {
    let mut store = Store::from_snapshot(project());
    let mut compiler = StyleCompiler::default();
    compiler.compile(store.data().view()).unwrap();

    let commit = store
        .transaction(|tx| Ok(tx.delete_breakpoint("tablet")))
        .unwrap();
    let delta = compiler
        .apply_transaction(store.data().view(), &commit.transaction.unwrap())
        .unwrap();
    assert!(delta.full);
    assert!(!delta.css_text.contains("991px"));
    assert_eq!(delta.removed.len(), 1);
}

#[test]
fn artifact_wraps_the_output() {
    let css = StyleCompiler::default().compile(project().view()).unwrap().css_text;
    let artifact = CssArtifact::new(css.clone());
    assert_eq!(artifact.css_text(), css);
    assert!(artifact.style_tag().contains("[data-ws-id=\"card\"]"));
    assert_eq!(artifact, CssArtifact::new(css));
}
