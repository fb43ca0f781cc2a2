use thiserror::Error;

/// Configuration problems that abort a build before any artifact is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("curated metadata missing for ids: {}", format_ids(.ids))]
    MissingMetadata { ids: Vec<String> },
    #[error("catalogue lists `{id}` more than once")]
    DuplicateId { id: String },
    #[error("catalogue entry #{index} has an empty id")]
    EmptyId { index: usize },
}

fn format_ids(ids: &[String]) -> String {
    format!("[{}]", ids.join(", "))
}

#[cfg(test)]
mod tests {
    use super::BuildError;

    #[test]
    fn missing_metadata_message_lists_ids() {
        let error = BuildError::MissingMetadata {
            ids: vec!["alpha".to_string(), "beta".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "curated metadata missing for ids: [alpha, beta]"
        );
    }

    #[test]
    fn build_error_survives_anyhow_round_trip() {
        let error: anyhow::Error = BuildError::DuplicateId {
            id: "arch".to_string(),
        }
        .into();
        let typed = error.downcast_ref::<BuildError>().expect("typed error");
        assert_eq!(
            typed,
            &BuildError::DuplicateId {
                id: "arch".to_string()
            }
        );
    }
}
