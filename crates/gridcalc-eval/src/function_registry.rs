use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::function::Function;
use crate::token::FunctionId;

/// Prefix newer files put in front of functions added after the 2007 format.
const FUTURE_FUNCTION_PREFIX: &str = "_XLFN.";

/// Name/index → implementation. Immutable once shared.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    by_name: FxHashMap<String, Arc<dyn Function>>,
    by_index: FxHashMap<u16, Arc<dyn Function>>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.by_name.len())
            .finish()
    }
}

fn normalise(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.strip_prefix(FUTURE_FUNCTION_PREFIX) {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry holding every built-in.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::builtins::load_builtins(&mut reg);
        reg
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(&mut self, f: Arc<dyn Function>) {
        if let Some(idx) = f.biff_index() {
            self.by_index.insert(idx, Arc::clone(&f));
        }
        self.by_name.insert(normalise(f.name()), f);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.by_name.get(&normalise(name)).cloned()
    }

    pub fn get_by_index(&self, index: u16) -> Option<Arc<dyn Function>> {
        self.by_index.get(&index).cloned()
    }

    pub fn lookup(&self, id: &FunctionId) -> Option<Arc<dyn Function>> {
        match id {
            FunctionId::Name(name) => self.get(name),
            FunctionId::Index(idx) => self.get_by_index(*idx),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

static BUILTINS: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::with_builtins()));

/// Process-wide registry of built-ins, built on first use.
pub fn builtins() -> Arc<FunctionRegistry> {
    Arc::clone(&BUILTINS)
}

/// Look a built-in up by name.
pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    BUILTINS.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_strips_future_prefix() {
        let reg = builtins();
        assert!(reg.get("sum").is_some());
        assert!(reg.get("_xlfn.SUM").is_some());
        assert!(reg.get("NO.SUCH.FUNCTION").is_none());
    }

    #[test]
    fn core_functions_resolve_by_table_index() {
        let reg = builtins();
        assert_eq!(reg.get_by_index(4).map(|f| f.name()), Some("SUM"));
        assert_eq!(reg.get_by_index(1).map(|f| f.name()), Some("IF"));
        assert_eq!(reg.get_by_index(120).map(|f| f.name()), Some("SUBSTITUTE"));
        assert_eq!(reg.get_by_index(315).map(|f| f.name()), Some("SLOPE"));
        assert_eq!(reg.get_by_index(344).map(|f| f.name()), Some("SUBTOTAL"));
    }

    #[test]
    fn analysis_toolpak_functions_are_name_only() {
        let reg = builtins();
        for name in ["QUOTIENT", "EDATE", "EOMONTH"] {
            let f = reg.get(name).expect(name);
            assert_eq!(f.biff_index(), None);
        }
    }
}
