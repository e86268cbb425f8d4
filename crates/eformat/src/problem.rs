//! Non-throwing structural diagnostics collected by `problems()`.

/// A single structural defect found while checking a fragment.
///
/// Distinct from [`crate::Error`]: a `FragmentProblem` is collected into a
/// `Vec` by the non-throwing check path, it never unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentProblem {
    WrongMarker,
    WrongRodMarker,
    UnsupportedVersion,
    WrongFragmentSize,
    UnsupportedRodVersion,
    WrongRodHeaderSize,
    WrongRodFragmentSize,
}

impl std::fmt::Display for FragmentProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FragmentProblem::WrongMarker => "wrong marker",
            FragmentProblem::WrongRodMarker => "wrong ROD marker",
            FragmentProblem::UnsupportedVersion => "unsupported version",
            FragmentProblem::WrongFragmentSize => "wrong fragment size",
            FragmentProblem::UnsupportedRodVersion => "unsupported ROD version",
            FragmentProblem::WrongRodHeaderSize => "wrong ROD header size",
            FragmentProblem::WrongRodFragmentSize => "wrong ROD fragment size",
        };
        f.write_str(s)
    }
}
