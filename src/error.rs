use thiserror::Error;

pub type LocateResult<T> = std::result::Result<T, LocateError>;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("{source_name} unavailable: {reason}")]
    DirectoryUnavailable {
        source_name: &'static str,
        reason: String,
    },

    #[error("no administrative division matches '{0}'")]
    NoDivisionMatch(String),

    #[error("could not determine ISO3 code for '{0}'")]
    IsoUndetermined(String),

    #[error("no region code produced data (tried: {})", display_tried(.tried))]
    CandidateExhausted { tried: Vec<String> },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl LocateError {
    pub fn unavailable(source_name: &'static str, reason: impl ToString) -> Self {
        let err = LocateError::DirectoryUnavailable {
            source_name,
            reason: reason.to_string(),
        };
        tracing::error!("{}", err);
        err
    }
}

fn display_tried(tried: &[String]) -> String {
    tried
        .iter()
        .map(|t| if t.is_empty() { "<none>" } else { t.as_str() })
        .collect::<Vec<&str>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_lists_every_candidate() {
        let err = LocateError::CandidateExhausted {
            tried: vec!["PT.LI".into(), "PRT".into(), "".into()],
        };
        assert_eq!(
            err.to_string(),
            "no region code produced data (tried: PT.LI, PRT, <none>)"
        );
    }
}
