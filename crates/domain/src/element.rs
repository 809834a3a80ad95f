//! Element specs — declarative descriptions of elements to create in the host tree.

/// Description of an element (and its subtree) to be created by the host.
///
/// Text, when set, becomes the first child text node; `children` follow it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// Start a spec for an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Add one or more whitespace-separated classes.
    #[must_use]
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    /// Set an attribute, replacing any previous value.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the spec lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_split_whitespace_separated_classes() {
        let spec = ElementSpec::new("div").class("a  b\tc");
        assert_eq!(spec.classes, vec!["a", "b", "c"]);
        assert!(spec.has_class("b"));
        assert!(!spec.has_class("d"));
    }

    #[test]
    fn should_replace_existing_attribute() {
        let spec = ElementSpec::new("div")
            .attr("title", "first")
            .attr("title", "second");
        assert_eq!(
            spec.attributes,
            vec![("title".to_string(), "second".to_string())]
        );
    }

    #[test]
    fn should_lowercase_tag() {
        assert_eq!(ElementSpec::new("BUTTON").tag, "button");
    }

    #[test]
    fn should_nest_children_in_order() {
        let spec = ElementSpec::new("ul")
            .child(ElementSpec::new("li").text("one"))
            .child(ElementSpec::new("li").text("two"));
        let texts: Vec<_> = spec
            .children
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
