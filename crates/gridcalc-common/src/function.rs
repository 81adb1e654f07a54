/// How a function wants one of its arguments delivered.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum ParamClass {
    /// A single scalar; areas and arrays are reduced to their top-left element
    /// unless the call runs in array context.
    #[default]
    Value,
    /// The reference itself (`ROW`, `ROWS`, `SUBTOTAL`, …).
    Reference,
    /// Every element of an area or array (`SUM`, `SLOPE`, …).
    Array,
}

impl ParamClass {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" | "v" => Some(Self::Value),
            "reference" | "ref" | "r" => Some(Self::Reference),
            "array" | "a" => Some(Self::Array),
            _ => None,
        }
    }

    pub fn wants_reference(self) -> bool {
        matches!(self, Self::Reference)
    }
}
