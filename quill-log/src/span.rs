//! Span：一段有名字的执行上下文（例如 `tokenize`、`parse`）

/// Span ID，同一个 logger 内单调递增
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub id: SpanId,
    pub name: &'static str,
}

impl Span {
    pub const fn new(id: SpanId, name: &'static str) -> Self {
        Span { id, name }
    }
}
