//! The table of content stream operators.

/// The group an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// `w`, `J`, `j`, `M`, `d`, `ri`, `i` and `gs`.
    GeneralGraphicsState,
    /// `q`, `Q` and `cm`.
    SpecialGraphicsState,
    /// `m`, `l`, `c`, `v`, `y`, `h` and `re`.
    PathConstruction,
    /// `S`, `s`, `f`, `F`, `f*`, `B`, `B*`, `b`, `b*` and `n`.
    PathPainting,
    /// `W` and `W*`.
    Clipping,
    /// `BT` and `ET`.
    TextObject,
    /// `Tc`, `Tw`, `Tz`, `TL`, `Tf`, `Tr` and `Ts`.
    TextState,
    /// `Td`, `TD`, `Tm` and `T*`.
    TextPositioning,
    /// `Tj`, `TJ`, `'` and `"`.
    TextShowing,
    /// `d0` and `d1`.
    Type3,
    /// Operators setting color spaces and colors.
    Color,
    /// `sh`.
    Shading,
    /// `BI`, `ID` and `EI`.
    InlineImage,
    /// `Do`.
    XObject,
    /// `MP`, `DP`, `BMC`, `BDC` and `EMC`.
    MarkedContent,
    /// `BX` and `EX`.
    Compatibility,
}

impl OperatorKind {
    /// Whether operators of this kind may appear inside a path object.
    pub fn is_path(self) -> bool {
        matches!(
            self,
            Self::PathConstruction | Self::PathPainting | Self::Clipping
        )
    }
}

/// The number of operands an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands.
    Fixed(u8),
    /// Any number of operands, like for `SC` or `scn`.
    Variable,
}

impl Arity {
    /// Whether `count` operands are acceptable.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Fixed(n) => n as usize == count,
            Self::Variable => true,
        }
    }
}

/// An entry of the operator table.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    /// The operator keyword.
    pub name: &'static [u8],
    /// The group of the operator.
    pub kind: OperatorKind,
    /// The number of operands.
    pub arity: Arity,
}

macro_rules! op {
    ($name:expr, $kind:ident, var) => {
        OperatorInfo {
            name: $name,
            kind: OperatorKind::$kind,
            arity: Arity::Variable,
        }
    };
    ($name:expr, $kind:ident, $n:expr) => {
        OperatorInfo {
            name: $name,
            kind: OperatorKind::$kind,
            arity: Arity::Fixed($n),
        }
    };
}

/// All operators defined for content streams.
pub const OPERATORS: &[OperatorInfo] = &[
    op!(b"w", GeneralGraphicsState, 1),
    op!(b"J", GeneralGraphicsState, 1),
    op!(b"j", GeneralGraphicsState, 1),
    op!(b"M", GeneralGraphicsState, 1),
    op!(b"d", GeneralGraphicsState, 2),
    op!(b"ri", GeneralGraphicsState, 1),
    op!(b"i", GeneralGraphicsState, 1),
    op!(b"gs", GeneralGraphicsState, 1),
    op!(b"q", SpecialGraphicsState, 0),
    op!(b"Q", SpecialGraphicsState, 0),
    op!(b"cm", SpecialGraphicsState, 6),
    op!(b"m", PathConstruction, 2),
    op!(b"l", PathConstruction, 2),
    op!(b"c", PathConstruction, 6),
    op!(b"v", PathConstruction, 4),
    op!(b"y", PathConstruction, 4),
    op!(b"h", PathConstruction, 0),
    op!(b"re", PathConstruction, 4),
    op!(b"S", PathPainting, 0),
    op!(b"s", PathPainting, 0),
    op!(b"f", PathPainting, 0),
    op!(b"F", PathPainting, 0),
    op!(b"f*", PathPainting, 0),
    op!(b"B", PathPainting, 0),
    op!(b"B*", PathPainting, 0),
    op!(b"b", PathPainting, 0),
    op!(b"b*", PathPainting, 0),
    op!(b"n", PathPainting, 0),
    op!(b"W", Clipping, 0),
    op!(b"W*", Clipping, 0),
    op!(b"BT", TextObject, 0),
    op!(b"ET", TextObject, 0),
    op!(b"Tc", TextState, 1),
    op!(b"Tw", TextState, 1),
    op!(b"Tz", TextState, 1),
    op!(b"TL", TextState, 1),
    op!(b"Tf", TextState, 2),
    op!(b"Tr", TextState, 1),
    op!(b"Ts", TextState, 1),
    op!(b"Td", TextPositioning, 2),
    op!(b"TD", TextPositioning, 2),
    op!(b"Tm", TextPositioning, 6),
    op!(b"T*", TextPositioning, 0),
    op!(b"Tj", TextShowing, 1),
    op!(b"TJ", TextShowing, 1),
    op!(b"'", TextShowing, 1),
    op!(b"\"", TextShowing, 3),
    op!(b"d0", Type3, 2),
    op!(b"d1", Type3, 6),
    op!(b"CS", Color, 1),
    op!(b"cs", Color, 1),
    op!(b"SC", Color, var),
    op!(b"SCN", Color, var),
    op!(b"sc", Color, var),
    op!(b"scn", Color, var),
    op!(b"G", Color, 1),
    op!(b"g", Color, 1),
    op!(b"RG", Color, 3),
    op!(b"rg", Color, 3),
    op!(b"K", Color, 4),
    op!(b"k", Color, 4),
    op!(b"sh", Shading, 1),
    op!(b"BI", InlineImage, 0),
    op!(b"ID", InlineImage, 0),
    op!(b"EI", InlineImage, 0),
    op!(b"Do", XObject, 1),
    op!(b"MP", MarkedContent, 1),
    op!(b"DP", MarkedContent, 2),
    op!(b"BMC", MarkedContent, 1),
    op!(b"BDC", MarkedContent, 2),
    op!(b"EMC", MarkedContent, 0),
    op!(b"BX", Compatibility, 0),
    op!(b"EX", Compatibility, 0),
];

/// Look up an operator in the table.
pub fn lookup(operator: &[u8]) -> Option<&'static OperatorInfo> {
    OPERATORS.iter().find(|info| info.name == operator)
}

/// The group of an operator, `None` for unknown operators.
pub fn kind(operator: &[u8]) -> Option<OperatorKind> {
    lookup(operator).map(|info| info.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn names_are_unique() {
        let names = OPERATORS.iter().map(|o| o.name).collect::<FxHashSet<_>>();
        assert_eq!(names.len(), OPERATORS.len());
    }

    #[test]
    fn lookup_operators() {
        assert_eq!(kind(b"re"), Some(OperatorKind::PathConstruction));
        assert_eq!(kind(b"f*"), Some(OperatorKind::PathPainting));
        assert_eq!(kind(b"\""), Some(OperatorKind::TextShowing));
        assert_eq!(kind(b"scn"), Some(OperatorKind::Color));
        assert_eq!(kind(b"foo"), None);
    }

    #[test]
    fn arity() {
        assert!(lookup(b"cm").unwrap().arity.accepts(6));
        assert!(!lookup(b"m").unwrap().arity.accepts(1));
        assert!(lookup(b"SCN").unwrap().arity.accepts(5));
    }

    #[test]
    fn path_kinds() {
        assert!(OperatorKind::Clipping.is_path());
        assert!(!OperatorKind::TextObject.is_path());
    }
}
