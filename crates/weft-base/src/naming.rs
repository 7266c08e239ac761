//! Naming conventions that connect attributes, methods and events.
//!
//! - attribute `color` notifies `_onChangeColor` and triggers `change:color`
//! - config key `onShow` listens to `show`, `onChangeColor` to `change:color`
//! - config keys `beforeShow` / `afterShow` advise the `show` method

/// How a declared handler key is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// `on<Event>`: an event listener
    On,
    /// `before<Method>`: advice run before the method
    Before,
    /// `after<Method>`: advice run after the method
    After,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [HandlerKind::On, HandlerKind::Before, HandlerKind::After];

    pub fn prefix(self) -> &'static str {
        match self {
            HandlerKind::On => "on",
            HandlerKind::Before => "before",
            HandlerKind::After => "after",
        }
    }
}

/// A config key resolved to the event (or method) it binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredHandler {
    pub kind: HandlerKind,
    /// Event name for [`HandlerKind::On`], method name otherwise.
    pub target: String,
}

pub(crate) fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `color` -> `_onChangeColor`
pub(crate) fn change_method(attr: &str) -> String {
    format!("_onChange{}", ucfirst(attr))
}

/// `color` -> `change:color`
pub(crate) fn change_event(attr: &str) -> String {
    format!("change:{}", attr)
}

/// `(On, color)` -> `onChangeColor`
pub(crate) fn change_handler_key(kind: HandlerKind, attr: &str) -> String {
    format!("{}Change{}", kind.prefix(), ucfirst(attr))
}

/// Resolve a config key by the generic pattern `(on|before|after)[A-Z]...`.
///
/// `Show` becomes `show` and `ChangeTitle` becomes `change:title`. Attribute
/// names that do not survive the lower-casing round trip (`URL`) are resolved
/// through the per-class table instead.
pub(crate) fn parse_handler_key(key: &str) -> Option<DeclaredHandler> {
    let (kind, rest) = HandlerKind::ALL
        .iter()
        .find_map(|kind| key.strip_prefix(kind.prefix()).map(|rest| (*kind, rest)))?;

    if !rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return None;
    }

    let target = match rest.strip_prefix("Change") {
        Some(attr) if attr.chars().next().is_some_and(|c| c.is_ascii_uppercase()) => {
            change_event(&lcfirst(attr))
        }
        _ => lcfirst(rest),
    };

    Some(DeclaredHandler { kind, target })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_helpers() {
        assert_eq!(ucfirst("color"), "Color");
        assert_eq!(lcfirst("Show"), "show");
        assert_eq!(ucfirst(""), "");
        assert_eq!(change_method("fn3"), "_onChangeFn3");
        assert_eq!(change_handler_key(HandlerKind::On, "size"), "onChangeSize");
    }

    #[test]
    fn test_parse_plain_events() {
        assert_eq!(
            parse_handler_key("onShow"),
            Some(DeclaredHandler {
                kind: HandlerKind::On,
                target: "show".into()
            })
        );
        assert_eq!(
            parse_handler_key("beforeShow"),
            Some(DeclaredHandler {
                kind: HandlerKind::Before,
                target: "show".into()
            })
        );
        assert_eq!(
            parse_handler_key("afterHide").map(|h| h.kind),
            Some(HandlerKind::After)
        );
    }

    #[test]
    fn test_parse_change_events() {
        assert_eq!(
            parse_handler_key("onChangeColor").map(|h| h.target),
            Some("change:color".to_string())
        );
        // `Change` alone is an ordinary event name
        assert_eq!(
            parse_handler_key("onChange").map(|h| h.target),
            Some("change".to_string())
        );
        assert_eq!(
            parse_handler_key("onChanged").map(|h| h.target),
            Some("changed".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_non_handlers() {
        assert_eq!(parse_handler_key("once"), None);
        assert_eq!(parse_handler_key("online"), None);
        assert_eq!(parse_handler_key("on"), None);
        assert_eq!(parse_handler_key("color"), None);
        assert_eq!(parse_handler_key("beforehand"), None);
    }
}
