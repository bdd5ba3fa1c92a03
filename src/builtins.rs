#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Print,
    Input,
    Int,
    Range,
}

impl BuiltinFunction {
    pub const ALL: [Self; 4] = [Self::Print, Self::Input, Self::Int, Self::Range];

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Input => "input",
            Self::Int => "int",
            Self::Range => "range",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            "input" => Some(Self::Input),
            "int" => Some(Self::Int),
            "range" => Some(Self::Range),
            _ => None,
        }
    }
}
