//! Catalogue statique des styles de portrait proposés à la sélection.

use serde::Serialize;

use crate::infrastructure::error::{bad_request, AppResult};

/// Nombre de styles qu'une galerie doit sélectionner
pub const REQUIRED_STYLE_COUNT: usize = 2;

/// Un style de fond/ambiance proposé dans le parcours de sélection
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Style {
    pub id: &'static str,
    pub name: &'static str,
    pub image: &'static str,
}

pub const STYLES: [Style; 8] = [
    Style {
        id: "grey",
        name: "Grey",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725592466/styles/grey-female_1.jpg",
    },
    Style {
        id: "black",
        name: "Black",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/black-female.jpg",
    },
    Style {
        id: "blue",
        name: "Blue",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/blue-female.jpg",
    },
    Style {
        id: "red",
        name: "Red",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/red-female.jpg",
    },
    Style {
        id: "green",
        name: "Green",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/green-female.jpg",
    },
    Style {
        id: "yellow",
        name: "Yellow",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/yellow-female.jpg",
    },
    Style {
        id: "purple",
        name: "Purple",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/purple-female.jpg",
    },
    Style {
        id: "orange",
        name: "Orange",
        image: "https://res.cloudinary.com/duz3pqofn/image/upload/v1725589489/styles/orange-female.jpg",
    },
];

/// Cherche un style par son identifiant
pub fn find(id: &str) -> Option<&'static Style> {
    STYLES.iter().find(|style| style.id == id)
}

/// Valide une sélection de styles: exactement deux, tous connus, sans doublon
pub fn validate_selection(styles: &[String]) -> AppResult<()> {
    if styles.len() != REQUIRED_STYLE_COUNT {
        return Err(bad_request("Invalid styles selection"));
    }

    for id in styles {
        if find(id).is_none() {
            return Err(bad_request(format!("Unknown style: {}", id)));
        }
    }

    if styles[0] == styles[1] {
        return Err(bad_request("Styles must be distinct"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_style() {
        assert_eq!(find("grey").unwrap().name, "Grey");
        assert!(find("sepia").is_none());
    }

    #[test]
    fn test_validate_selection_ok() {
        let styles = vec!["grey".to_string(), "blue".to_string()];
        assert!(validate_selection(&styles).is_ok());
    }

    #[test]
    fn test_validate_selection_wrong_count() {
        assert!(validate_selection(&["grey".to_string()]).is_err());
        assert!(validate_selection(&[
            "grey".to_string(),
            "blue".to_string(),
            "red".to_string()
        ])
        .is_err());
        assert!(validate_selection(&[]).is_err());
    }

    #[test]
    fn test_validate_selection_unknown_style() {
        let styles = vec!["grey".to_string(), "sepia".to_string()];
        assert!(validate_selection(&styles).is_err());
    }

    #[test]
    fn test_validate_selection_duplicates() {
        let styles = vec!["grey".to_string(), "grey".to_string()];
        assert!(validate_selection(&styles).is_err());
    }
}
