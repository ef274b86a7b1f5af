//! Abstract syntax tree for compiled selector patterns.
//!
//! A pattern is a comma-separated list of complex selectors; each complex
//! selector is a chain of compound selectors joined by combinators; each
//! compound selector is a conjunction of simple tests (tag, id, class,
//! attribute, pseudo-class) that all apply to one element.

/// A full parsed pattern: comma-separated selector groups.
///
/// A node matches the list if it matches any group.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    /// The alternatives, in source order.
    pub groups: Vec<ComplexSelector>,
}

/// A chain of compound selectors joined by combinators, e.g. `ul > li a`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// The compounds in left-to-right source order. The first part always
    /// carries [`Combinator::None`]; every later part records how it relates
    /// to the part before it.
    pub parts: Vec<CompoundPart>,
}

/// One compound selector plus the combinator linking it to its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundPart {
    /// How this compound relates to the previous one in the chain.
    pub combinator: Combinator,
    /// The conjunction of simple tests.
    pub compound: CompoundSelector,
}

/// Combinator between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// First compound in a chain (no predecessor).
    None,
    /// Whitespace — any ancestor.
    Descendant,
    /// `>` — parent.
    Child,
    /// `+` — immediately preceding element sibling.
    NextSibling,
    /// `~` — any preceding element sibling.
    SubsequentSibling,
}

/// A conjunction of simple tests applying to a single element.
///
/// An empty compound (all fields unset) is invalid and rejected by the
/// parser; the universal selector `*` sets `universal` explicitly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    /// Tag name test, lowercase (`div`). `None` when absent or universal.
    pub tag: Option<String>,
    /// `*` was written explicitly.
    pub universal: bool,
    /// `#id` test.
    pub id: Option<String>,
    /// `.class` tests (all must be present).
    pub classes: Vec<String>,
    /// `[attr…]` tests (all must hold).
    pub attrs: Vec<AttrSelector>,
    /// Pseudo-class tests (all must hold).
    pub pseudos: Vec<PseudoClass>,
}

impl CompoundSelector {
    /// Returns true if no simple test was written at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }
}

/// An attribute test, e.g. `[href^="https:"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
    /// The attribute name, lowercase.
    pub name: String,
    /// The comparison to apply.
    pub op: AttrOp,
    /// The comparison operand. Empty for [`AttrOp::Exists`].
    pub value: String,
}

/// Attribute comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]` — the attribute is present.
    Exists,
    /// `[attr=v]` — exact value match.
    Equals,
    /// `[attr^=v]` — value starts with the operand.
    Prefix,
    /// `[attr$=v]` — value ends with the operand.
    Suffix,
    /// `[attr*=v]` — value contains the operand.
    Contains,
    /// `[attr~=v]` — operand is one of the whitespace-separated tokens.
    Includes,
    /// `[attr|=v]` — value equals the operand or starts with `operand-`.
    DashMatch,
}

/// A supported pseudo-class test.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    /// `:first-child` — first element child of its parent.
    FirstChild,
    /// `:last-child` — last element child of its parent.
    LastChild,
    /// `:nth-child(An+B | n | odd | even)` — position among element children.
    NthChild(NthExpr),
    /// `:not(compound)` — negation of a compound selector.
    Not(Box<CompoundSelector>),
}

/// An `An+B` expression for `:nth-child`.
///
/// Matches 1-based position `p` when `p = A*n + B` for some integer `n >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpr {
    /// The step `A`.
    pub a: i32,
    /// The offset `B`.
    pub b: i32,
}

impl NthExpr {
    /// `odd` is `2n+1`.
    pub const ODD: Self = Self { a: 2, b: 1 };
    /// `even` is `2n`.
    pub const EVEN: Self = Self { a: 2, b: 0 };

    /// Tests a 1-based sibling position against this expression.
    #[must_use]
    pub fn matches(&self, position: i32) -> bool {
        let diff = position - self.b;
        if self.a == 0 {
            return diff == 0;
        }
        diff % self.a == 0 && diff / self.a >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_literal() {
        let nth = NthExpr { a: 0, b: 3 };
        assert!(nth.matches(3));
        assert!(!nth.matches(2));
        assert!(!nth.matches(4));
    }

    #[test]
    fn test_nth_odd_even() {
        assert!(NthExpr::ODD.matches(1));
        assert!(NthExpr::ODD.matches(3));
        assert!(!NthExpr::ODD.matches(2));
        assert!(NthExpr::EVEN.matches(2));
        assert!(!NthExpr::EVEN.matches(1));
    }

    #[test]
    fn test_nth_an_plus_b() {
        // 3n+2 matches 2, 5, 8, ...
        let nth = NthExpr { a: 3, b: 2 };
        assert!(nth.matches(2));
        assert!(nth.matches(5));
        assert!(nth.matches(8));
        assert!(!nth.matches(3));
        assert!(!nth.matches(1));
    }

    #[test]
    fn test_nth_negative_step_never_below_b() {
        // -n+2 matches 2, 1 and nothing above
        let nth = NthExpr { a: -1, b: 2 };
        assert!(nth.matches(1));
        assert!(nth.matches(2));
        assert!(!nth.matches(3));
    }
}
