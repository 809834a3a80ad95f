//! Toggle control appearance — a two-state look derived from the active flag.

/// Visual state of the injected toggle control.
///
/// The appearance is a pure function of `active`; nothing else feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlAppearance {
    pub opacity: &'static str,
    pub color: &'static str,
    pub title: &'static str,
}

impl ControlAppearance {
    const ON: Self = Self {
        opacity: "1",
        color: "#ffffff",
        title: "Auto-resume is ON - Click to disable",
    };

    const OFF: Self = Self {
        opacity: "0.5",
        color: "#888",
        title: "Auto-resume is OFF - Click to enable",
    };

    /// Appearance for the given active flag.
    #[must_use]
    pub fn for_active(active: bool) -> Self {
        if active { Self::ON } else { Self::OFF }
    }

    /// Inline `style` attribute value for the control.
    #[must_use]
    pub fn style(&self) -> String {
        format!(
            "cursor: pointer; opacity: {}; color: {};",
            self.opacity, self.color
        )
    }

    /// Inline `style` attribute value for the control's icon.
    #[must_use]
    pub fn icon_style(&self) -> String {
        format!("color: {};", self.color)
    }
}
