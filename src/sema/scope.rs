//! Depth-tagged scope stack for variable resolution
//!
//! Variables live in one flat list tagged with the scope depth they were
//! declared at. Closing a scope purges every entry deeper than the new
//! depth in a single linear pass. Shadowing is rejected: no two live
//! entries may share a name, regardless of depth.

use super::types::Type;
use crate::span::Span;

/// A declared variable
#[derive(Debug, Clone)]
pub struct VarEntry {
    pub name: String,
    pub ty: Type,
    pub depth: usize,
    pub span: Span,
}

/// The scope stack
#[derive(Debug, Default)]
pub struct ScopeStack {
    entries: Vec<VarEntry>,
    depth: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enter a nested scope
    pub fn enter(&mut self) {
        self.depth += 1;
    }

    /// Leave the current scope, purging every entry declared inside it
    pub fn exit(&mut self) {
        debug_assert!(self.depth > 0, "scope underflow");
        self.depth -= 1;
        let depth = self.depth;
        self.entries.retain(|entry| entry.depth <= depth);
    }

    /// Declare a variable at the current depth.
    ///
    /// Fails when any live entry already carries the name; the table is
    /// left unchanged in that case.
    pub fn declare(&mut self, name: &str, ty: Type, span: Span) -> Result<(), VarEntry> {
        if let Some(existing) = self.lookup(name) {
            return Err(existing.clone());
        }
        self.entries.push(VarEntry {
            name: name.to_string(),
            ty,
            depth: self.depth,
            span,
        });
        Ok(())
    }

    /// Look up a variable, most recently declared first
    pub fn lookup(&self, name: &str) -> Option<&VarEntry> {
        self.entries.iter().rev().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(scopes: &mut ScopeStack, name: &str) -> bool {
        scopes.declare(name, Type::Int, Span::point(0)).is_ok()
    }

    #[test]
    fn test_lookup_after_declare() {
        let mut scopes = ScopeStack::new();
        assert!(declare(&mut scopes, "x"));
        assert!(scopes.lookup("x").is_some());
        assert!(scopes.lookup("y").is_none());
    }

    #[test]
    fn test_inner_scope_visible_then_purged() {
        let mut scopes = ScopeStack::new();
        declare(&mut scopes, "outer");
        scopes.enter();
        declare(&mut scopes, "inner");
        assert!(scopes.lookup("inner").is_some());
        assert!(scopes.lookup("outer").is_some());
        scopes.exit();
        assert!(scopes.lookup("inner").is_none());
        assert!(scopes.lookup("outer").is_some());
    }

    #[test]
    fn test_purge_exactness() {
        // Closing a block removes exactly the entries declared inside it
        let mut scopes = ScopeStack::new();
        declare(&mut scopes, "a");
        scopes.enter();
        declare(&mut scopes, "b");
        scopes.enter();
        declare(&mut scopes, "c");
        declare(&mut scopes, "d");
        scopes.exit();
        assert_eq!(scopes.len(), 2);
        assert!(scopes.lookup("b").is_some());
        assert!(scopes.lookup("c").is_none());
        assert!(scopes.lookup("d").is_none());
        scopes.exit();
        assert_eq!(scopes.len(), 1);
        assert!(scopes.lookup("a").is_some());
    }

    #[test]
    fn test_shadowing_rejected() {
        let mut scopes = ScopeStack::new();
        declare(&mut scopes, "x");
        scopes.enter();
        assert!(!declare(&mut scopes, "x"));
        // The failed declaration must not add a second entry
        assert_eq!(scopes.len(), 1);
    }

    #[test]
    fn test_redeclare_after_scope_closes() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        declare(&mut scopes, "x");
        scopes.exit();
        scopes.enter();
        assert!(declare(&mut scopes, "x"));
        scopes.exit();
    }
}
