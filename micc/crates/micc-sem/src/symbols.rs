//! The symbol table.
//!
//! A fixed-width bucketed hash: `hash(name) = sum of code points mod N`
//! (100 buckets by default), each bucket chaining indices into an
//! insertion-ordered arena. The arena is what reporting iterates, so
//! symbol listings are deterministic regardless of hash distribution.
//!
//! The table exposes narrow operations only (`insert`, `lookup`,
//! `mark_used`, `mark_initialised`); no references to symbols escape
//! long enough to alias the table.

use std::fmt;

use micc_par::TypeName;
use micc_util::Value;

/// Default number of hash buckets.
pub const DEFAULT_BUCKETS: usize = 100;

/// What a variable currently holds, as far as the analyser can tell.
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolValue {
    /// A compile-time constant assigned to the variable.
    Literal(Value),
    /// The variable is initialised by a `cin >>` at run time.
    Input,
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Literal(value) => write!(f, "{}", value),
            SymbolValue::Input => write!(f, "<input>"),
        }
    }
}

/// A declared variable and its usage bookkeeping.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// Variable name.
    pub name: String,
    /// Declared type.
    pub ty: TypeName,
    /// Declaration line (1-based).
    pub line: u32,
    /// Declaration column (1-based).
    pub column: u32,
    /// True once the variable is assigned or read into.
    pub initialised: bool,
    /// True once the variable appears anywhere after its declaration.
    pub used: bool,
    /// Last known value, when the analyser could determine one.
    pub value: Option<SymbolValue>,
    /// Hash bucket the symbol lives in.
    pub bucket: usize,
    /// Every line the variable occurs on; the declaration line is
    /// always the first entry. Duplicates are kept on purpose (one
    /// entry per occurrence).
    pub use_lines: Vec<u32>,
}

/// One row of the symbol report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub identifier: String,
    pub register: usize,
    pub value: String,
    pub data_type: String,
    pub scope: String,
    pub use_lines: Vec<u32>,
}

/// Bucketed hash table of symbols with deterministic iteration order.
pub struct SymbolTable {
    buckets: Vec<Vec<usize>>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Table with the default bucket count.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Table with `buckets` hash buckets.
    pub fn with_buckets(buckets: usize) -> Self {
        assert!(buckets > 0, "bucket count must be positive");
        Self {
            buckets: vec![Vec::new(); buckets],
            symbols: Vec::new(),
        }
    }

    /// Hash of a name: sum of code points modulo the bucket count.
    pub fn hash(&self, name: &str) -> usize {
        let sum: usize = name.chars().map(|c| c as usize).sum();
        sum % self.buckets.len()
    }

    /// Insert a new symbol.
    ///
    /// On a duplicate, the offending line is recorded in the existing
    /// symbol's `use_lines` and the original declaration position is
    /// returned as the error.
    pub fn insert(
        &mut self,
        name: &str,
        ty: TypeName,
        line: u32,
        column: u32,
    ) -> Result<(), (u32, u32)> {
        let bucket = self.hash(name);
        if let Some(&index) = self.buckets[bucket]
            .iter()
            .find(|&&i| self.symbols[i].name == name)
        {
            let prior = &mut self.symbols[index];
            prior.use_lines.push(line);
            return Err((prior.line, prior.column));
        }

        let index = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            line,
            column,
            initialised: false,
            used: false,
            value: None,
            bucket,
            use_lines: vec![line],
        });
        self.buckets[bucket].push(index);
        Ok(())
    }

    /// Find a symbol by name.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let bucket = self.hash(name);
        self.buckets[bucket]
            .iter()
            .map(|&i| &self.symbols[i])
            .find(|s| s.name == name)
    }

    fn lookup_index(&self, name: &str) -> Option<usize> {
        let bucket = self.hash(name);
        self.buckets[bucket]
            .iter()
            .copied()
            .find(|&i| self.symbols[i].name == name)
    }

    /// Mark a variable as used and record the line of the occurrence.
    pub fn mark_used(&mut self, name: &str, line: u32) {
        if let Some(index) = self.lookup_index(name) {
            let symbol = &mut self.symbols[index];
            symbol.used = true;
            symbol.use_lines.push(line);
        }
    }

    /// Mark a variable as initialised, optionally updating its known
    /// value. `None` keeps whatever value was recorded before.
    pub fn mark_initialised(&mut self, name: &str, value: Option<SymbolValue>) {
        if let Some(index) = self.lookup_index(name) {
            let symbol = &mut self.symbols[index];
            symbol.initialised = true;
            if value.is_some() {
                symbol.value = value;
            }
        }
    }

    /// Symbols in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of declared symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The report rows of the driver's symbol listing, in declaration
    /// order with use lines sorted ascending.
    pub fn report(&self) -> Vec<ReportRow> {
        self.symbols
            .iter()
            .map(|symbol| {
                let mut use_lines = symbol.use_lines.clone();
                use_lines.sort_unstable();
                ReportRow {
                    identifier: symbol.name.clone(),
                    register: symbol.bucket,
                    value: symbol
                        .value
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "<input>".to_string()),
                    data_type: symbol.ty.to_string(),
                    scope: "Global".to_string(),
                    use_lines,
                }
            })
            .collect()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_code_point_sum() {
        let table = SymbolTable::with_buckets(100);
        // 'x' = 120
        assert_eq!(table.hash("x"), 20);
        // 'a'+'b' = 97+98 = 195
        assert_eq!(table.hash("ab"), 95);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = SymbolTable::new();
        table.insert("x", TypeName::Int, 2, 9).unwrap();
        let symbol = table.lookup("x").unwrap();
        assert_eq!(symbol.ty, TypeName::Int);
        assert_eq!(symbol.use_lines, vec![2]);
        assert!(!symbol.initialised);
        assert!(!symbol.used);
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn test_duplicate_insert_records_line() {
        let mut table = SymbolTable::new();
        table.insert("x", TypeName::Int, 2, 9).unwrap();
        let err = table.insert("x", TypeName::Float, 3, 11).unwrap_err();
        assert_eq!(err, (2, 9));
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("x").unwrap().use_lines, vec![2, 3]);
    }

    #[test]
    fn test_chaining_handles_collisions() {
        // "ab" and "ba" hash identically; both must survive in the
        // same bucket.
        let mut table = SymbolTable::with_buckets(100);
        table.insert("ab", TypeName::Int, 1, 1).unwrap();
        table.insert("ba", TypeName::Float, 2, 1).unwrap();
        assert_eq!(table.hash("ab"), table.hash("ba"));
        assert_eq!(table.lookup("ab").unwrap().ty, TypeName::Int);
        assert_eq!(table.lookup("ba").unwrap().ty, TypeName::Float);
    }

    #[test]
    fn test_mark_used_and_initialised() {
        let mut table = SymbolTable::new();
        table.insert("n", TypeName::Int, 1, 1).unwrap();
        table.mark_used("n", 4);
        table.mark_used("n", 4);
        table.mark_initialised("n", Some(SymbolValue::Literal(Value::Int(7))));
        table.mark_initialised("n", None);

        let symbol = table.lookup("n").unwrap();
        assert!(symbol.used);
        assert!(symbol.initialised);
        assert_eq!(symbol.use_lines, vec![1, 4, 4]);
        // A later None does not wipe the recorded value.
        assert_eq!(symbol.value, Some(SymbolValue::Literal(Value::Int(7))));
    }

    #[test]
    fn test_report_rows() {
        let mut table = SymbolTable::new();
        table.insert("x", TypeName::Int, 2, 9).unwrap();
        table.mark_used("x", 4);
        table.mark_used("x", 3);

        let rows = table.report();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identifier, "x");
        assert_eq!(rows[0].register, table.hash("x"));
        assert_eq!(rows[0].value, "<input>");
        assert_eq!(rows[0].data_type, "int");
        assert_eq!(rows[0].scope, "Global");
        assert_eq!(rows[0].use_lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_report_in_declaration_order() {
        let mut table = SymbolTable::new();
        table.insert("zz", TypeName::Int, 1, 1).unwrap();
        table.insert("aa", TypeName::Int, 2, 1).unwrap();
        let names: Vec<String> = table.report().into_iter().map(|r| r.identifier).collect();
        assert_eq!(names, vec!["zz", "aa"]);
    }
}
