//! Per-resource field policy declarations.
//!
//! Adapters declare how their fields behave; the engine never hard-codes
//! a field name. In particular "omitted means clear" is a declared
//! per-field property, not something inferred from a field's type.

/// A group of fields only meaningful while a boolean toggle is true.
///
/// Gated fields are included in payloads only when the toggle's desired
/// value is true; otherwise they are omitted entirely (never sent as
/// null, never diffed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedGroup {
    /// Name of the controlling boolean field.
    pub toggle: &'static str,
    /// Fields hidden behind the toggle.
    pub fields: &'static [&'static str],
}

impl GatedGroup {
    /// Check whether `name` belongs to this group.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(&name)
    }
}

/// Field-handling policy declared by a resource adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicy {
    /// Fields that may change after creation and appear in update
    /// payloads.
    pub mutable: &'static [&'static str],
    /// Fields accepted at creation and never sent in updates, e.g.
    /// secrets the backend does not echo back.
    pub create_only: &'static [&'static str],
    /// Optional collections whose omission from desired state means
    /// "desired: empty" rather than "unspecified".
    pub list_clearable: &'static [&'static str],
    /// Field groups gated behind a boolean toggle.
    pub gated: &'static [GatedGroup],
}

impl FieldPolicy {
    /// Check if a field may appear in update payloads.
    pub fn is_mutable(&self, name: &str) -> bool {
        self.mutable.contains(&name)
    }

    /// Check if a field is only sent at creation.
    pub fn is_create_only(&self, name: &str) -> bool {
        self.create_only.contains(&name)
    }

    /// Check if omitting a field means "desired: empty".
    pub fn is_list_clearable(&self, name: &str) -> bool {
        self.list_clearable.contains(&name)
    }

    /// The gated group a field belongs to, if any.
    pub fn gate_for(&self, name: &str) -> Option<&GatedGroup> {
        self.gated.iter().find(|g| g.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static POLICY: FieldPolicy = FieldPolicy {
        mutable: &["description", "subprotocols", "approvers"],
        create_only: &["user_group"],
        list_clearable: &["subprotocols"],
        gated: &[GatedGroup {
            toggle: "approval_required",
            fields: &["approvers"],
        }],
    };

    #[test]
    fn test_field_classification() {
        assert!(POLICY.is_mutable("description"));
        assert!(!POLICY.is_mutable("user_group"));
        assert!(POLICY.is_create_only("user_group"));
        assert!(POLICY.is_list_clearable("subprotocols"));
        assert!(!POLICY.is_list_clearable("description"));
    }

    #[test]
    fn test_gate_lookup() {
        let gate = POLICY.gate_for("approvers").expect("approvers is gated");
        assert_eq!(gate.toggle, "approval_required");
        assert!(POLICY.gate_for("description").is_none());
        assert!(POLICY.gate_for("approval_required").is_none());
    }
}
