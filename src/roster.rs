use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

const PLAYER_NAME_COLUMN: &str = "player_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterOrigin {
    /// The roster file shipped next to the app, read at startup.
    Bundled,
    /// A file the operator picked.
    Chosen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterLoad {
    pub names: Vec<String>,
    pub hint: String,
}

/// Player names from comma-separated text.
///
/// With a header carrying a `player_name` column that column is read from
/// every following line; without one, the first column of every line is a name.
pub fn parse_roster(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(header_line) = lines.first() else {
        return Vec::new();
    };

    let name_column = header_line
        .split(',')
        .position(|column| column.trim().eq_ignore_ascii_case(PLAYER_NAME_COLUMN));

    let candidates: Vec<&str> = match name_column {
        Some(column_index) => lines[1..]
            .iter()
            .map(|line| line.split(',').nth(column_index).unwrap_or_default())
            .collect(),
        None => lines
            .iter()
            .map(|line| line.split(',').next().unwrap_or_default())
            .collect(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

pub async fn load_roster_file(path: &Path, origin: RosterOrigin) -> RosterLoad {
    let file_label = path
        .file_name()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let names = parse_roster(&text);
            tracing::info!(
                roster_path = %path.display(),
                player_count = names.len(),
                "Loaded player roster"
            );
            RosterLoad {
                hint: format!("Loaded {} players from {file_label}", names.len()),
                names,
            }
        }
        Err(error) => {
            tracing::warn!(
                roster_path = %path.display(),
                read_error = %error,
                "Failed to read player roster"
            );
            let hint = match origin {
                RosterOrigin::Bundled => format!(
                    "Could not auto-load {file_label}. Use \"Load Players CSV\" to choose a file."
                ),
                RosterOrigin::Chosen => "Failed to read CSV file.".to_string(),
            };
            RosterLoad {
                names: Vec::new(),
                hint,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_roster_file, parse_roster, RosterOrigin};

    #[test]
    fn reads_the_player_name_column_when_present() {
        let text = "team,Player_Name,role\r\nOpTic,Shotzzy,SMG\nOpTic, Dashy ,AR\nFaZe,Simp,SMG\nOpTic,Shotzzy,SMG\n";
        assert_eq!(parse_roster(text), vec!["Shotzzy", "Dashy", "Simp"]);
    }

    #[test]
    fn skips_rows_missing_the_name_column() {
        let text = "team,player_name\nOpTic\nFaZe,Cellium\n";
        assert_eq!(parse_roster(text), vec!["Cellium"]);
    }

    #[test]
    fn uses_first_column_without_a_header() {
        let text = "Kenny,Ravens\n\nPred,Ultra\nKenny,Ravens\n";
        assert_eq!(parse_roster(text), vec!["Kenny", "Pred"]);
    }

    #[test]
    fn empty_text_has_no_names() {
        assert!(parse_roster("").is_empty());
        assert!(parse_roster("\n \n").is_empty());
    }

    #[tokio::test]
    async fn loads_a_roster_file_with_a_hint() {
        let directory = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = directory.path().join("players.csv");
        std::fs::write(&path, "player_name\nAbuzah\nCleanX\n").expect("Failed to write roster");

        let load = load_roster_file(&path, RosterOrigin::Chosen).await;

        assert_eq!(load.names, vec!["Abuzah", "CleanX"]);
        assert_eq!(load.hint, "Loaded 2 players from players.csv");
    }

    #[tokio::test]
    async fn missing_bundled_roster_explains_how_to_pick_one() {
        let directory = tempfile::tempdir().expect("Failed to create temporary directory");
        let load = load_roster_file(&directory.path().join("players.csv"), RosterOrigin::Bundled).await;

        assert!(load.names.is_empty());
        assert_eq!(
            load.hint,
            "Could not auto-load players.csv. Use \"Load Players CSV\" to choose a file."
        );

        let chosen = load_roster_file(&directory.path().join("other.csv"), RosterOrigin::Chosen).await;
        assert_eq!(chosen.hint, "Failed to read CSV file.");
    }
}
