//! Attribute maps carried by nodes and edges.

use core::fmt::Debug;

use fg_core::Value;
use indexmap::IndexMap;

/// Insertion-ordered attribute map.
pub type Attributes<A> = IndexMap<String, A>;

/// Requirements on the value type stored in attribute maps.
///
/// `PartialEq` drives change detection: an update whose value compares equal
/// to the stored one is a no-op and emits nothing.
pub trait AttributeValue: Clone + PartialEq + Debug {
    /// Interpret the value as a list of port names (`inlets` / `outlets`).
    fn as_port_names(&self) -> Option<Vec<String>>;
}

impl AttributeValue for Value {
    fn as_port_names(&self) -> Option<Vec<String>> {
        self.as_string_list()
    }
}

/// Collect `(key, value)` pairs into an attribute map.
pub(crate) fn collect<I, K, A>(attrs: I) -> Attributes<A>
where
    I: IntoIterator<Item = (K, A)>,
    K: Into<String>,
{
    attrs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Outcome of merging new values into an attribute map.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Merge {
    pub added: Vec<String>,
    pub changed: Vec<String>,
}

/// Merge `updates` into `target`, reporting only keys that are new or whose
/// value differs from the stored one.
pub(crate) fn merge<A: AttributeValue>(target: &mut Attributes<A>, updates: Attributes<A>) -> Merge {
    let mut merge = Merge::default();
    for (name, value) in updates {
        match target.get_mut(&name) {
            Some(existing) if *existing == value => {}
            Some(existing) => {
                *existing = value;
                merge.changed.push(name);
            }
            None => {
                target.insert(name.clone(), value);
                merge.added.push(name);
            }
        }
    }
    merge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_reports_only_differences() {
        let mut attrs: Attributes<Value> = collect([("a", Value::from(1)), ("b", Value::from(2))]);
        let merge = merge(
            &mut attrs,
            collect([("a", Value::from(1)), ("b", Value::from(3)), ("c", Value::Null)]),
        );
        assert_eq!(merge.added, vec!["c".to_string()]);
        assert_eq!(merge.changed, vec!["b".to_string()]);
        assert_eq!(attrs["b"], Value::from(3));
    }

    #[test]
    fn port_names_from_value() {
        assert_eq!(
            Value::from(vec!["x", "y"]).as_port_names(),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(Value::from(1).as_port_names(), None);
    }
}
