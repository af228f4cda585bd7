use crate::errors::{ProvisionError, Result};

pub mod batch;
pub mod provision;

/// Trimmed, non-empty student usernames.
pub fn student_names(raw: &[String]) -> Result<Vec<String>> {
    let students: Vec<String> = raw
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if students.is_empty() {
        return Err(ProvisionError::Config("no student usernames given".to_string()));
    }
    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_student_names_are_trimmed() {
        let students = student_names(&names(&[" alice", "bob ", "", "  carol  "])).unwrap();
        assert_eq!(students, names(&["alice", "bob", "carol"]));
    }

    #[test]
    fn test_only_blank_students_is_config_error() {
        let result = student_names(&names(&["", "  "]));
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_no_students_is_config_error() {
        assert!(matches!(student_names(&[]), Err(ProvisionError::Config(_))));
    }
}
