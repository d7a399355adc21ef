//! Tests for #[derive(Action)] macro

#![allow(dead_code)]

use reducest::Action;

#[test]
fn test_unit_tuple_and_struct_variants() {
    #[derive(Action, Clone, Debug)]
    enum TodoAction {
        Clear,
        Add(String),
        Toggle { id: u32, done: bool },
    }

    assert_eq!(TodoAction::Clear.name(), "Clear");
    assert_eq!(TodoAction::Add("milk".into()).name(), "Add");
    assert_eq!(TodoAction::Toggle { id: 1, done: true }.name(), "Toggle");
}

#[test]
fn test_rename() {
    #[derive(Action, Clone, Debug)]
    enum CartAction {
        AddItem { sku: String },
        #[action(rename = "Checkout")]
        SubmitOrder,
    }

    assert_eq!(CartAction::AddItem { sku: "a1".into() }.name(), "AddItem");
    assert_eq!(CartAction::SubmitOrder.name(), "Checkout");
}

#[test]
fn test_generic_action() {
    #[derive(Action, Clone, Debug)]
    enum Wrapped<T: Clone + std::fmt::Debug + 'static> {
        Set(T),
        Unset,
    }

    assert_eq!(Wrapped::Set(3u8).name(), "Set");
    assert_eq!(Wrapped::<u8>::Unset.name(), "Unset");
}

#[test]
fn test_derived_names_drive_trace_filter() {
    use reducest::TraceConfig;

    #[derive(Action, Clone, Debug)]
    enum AppAction {
        Tick,
        CartAddItem,
    }

    let config = TraceConfig::default();
    assert!(!config.should_trace(AppAction::Tick.name()));
    assert!(config.should_trace(AppAction::CartAddItem.name()));
}
