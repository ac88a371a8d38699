/// Three-valued verdict of a domain oracle (branch condition, subtype
/// test, nullness query).
///
/// `Unknown` is the abstract-interpretation analogue of the `None` case
/// of a concrete truthiness test: the engine must explore both outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl Answer {
    pub fn may_be_yes(self) -> bool {
        matches!(self, Answer::Yes | Answer::Unknown)
    }

    pub fn may_be_no(self) -> bool {
        matches!(self, Answer::No | Answer::Unknown)
    }

    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }

    pub fn is_no(self) -> bool {
        self == Answer::No
    }

    pub fn is_unknown(self) -> bool {
        self == Answer::Unknown
    }

    pub fn negate(self) -> Answer {
        match self {
            Answer::Yes => Answer::No,
            Answer::No => Answer::Yes,
            Answer::Unknown => Answer::Unknown,
        }
    }
}

impl From<bool> for Answer {
    fn from(b: bool) -> Answer {
        if b { Answer::Yes } else { Answer::No }
    }
}
