use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three published datasets the viewer switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Movies,
    Kickstarter,
    VideoGames,
}

const DATA_BASE: &str =
    "https://cdn.rawgit.com/freeCodeCamp/testable-projects-fcc/a80ce8f9/src/data/tree_map";

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Movies, Dataset::Kickstarter, Dataset::VideoGames];

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Movies => "movie-data.json",
            Dataset::Kickstarter => "kickstarter-funding-data.json",
            Dataset::VideoGames => "video-game-sales-data.json",
        }
    }

    pub fn url(self) -> String {
        format!("{DATA_BASE}/{}", self.file_name())
    }

    pub fn title(self) -> &'static str {
        match self {
            Dataset::Movies => "Movie Sales",
            Dataset::Kickstarter => "Kickstarter Pledges",
            Dataset::VideoGames => "Video Game Sales",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Dataset::Movies => "Top 100 Highest Grossing Movies Grouped By Genre",
            Dataset::Kickstarter => {
                "Top 100 Most Pledged Kickstarter Campaigns Grouped By Category"
            }
            Dataset::VideoGames => "Top 100 Most Sold Video Games Grouped by Platform",
        }
    }

    /// Where to load this dataset from: a file under `data_dir` if given,
    /// the published URL otherwise.
    pub fn request(self, data_dir: Option<&Path>) -> Request {
        let location = match data_dir {
            Some(dir) => dir.join(self.file_name()).display().to_string(),
            None => self.url(),
        };
        Request {
            title: self.title().to_string(),
            description: self.description().to_string(),
            location,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dataset::Movies => "Movies",
            Dataset::Kickstarter => "Kickstarter",
            Dataset::VideoGames => "Video Games",
        })
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "movies" | "movie" => Ok(Dataset::Movies),
            "kickstarter" => Ok(Dataset::Kickstarter),
            "videogames" | "games" => Ok(Dataset::VideoGames),
            _ => Err(format!("unknown dataset `{s}`")),
        }
    }
}

/// One load: what to fetch and how to caption it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub title: String,
    pub description: String,
    pub location: String,
}

impl Request {
    /// A request for an arbitrary document, captioned with its location.
    pub fn for_location(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            title: location.clone(),
            description: String::new(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_button_labels() {
        assert_eq!("Video Games".parse::<Dataset>(), Ok(Dataset::VideoGames));
        assert_eq!("video-games".parse::<Dataset>(), Ok(Dataset::VideoGames));
        assert_eq!("Kickstarter".parse::<Dataset>(), Ok(Dataset::Kickstarter));
        assert!("books".parse::<Dataset>().is_err());
        for d in Dataset::ALL {
            assert_eq!(d.to_string().parse::<Dataset>(), Ok(d));
        }
    }

    #[test]
    fn requests_prefer_local_files() {
        let local = Dataset::Movies.request(Some(Path::new("data")));
        assert!(local.location.ends_with("movie-data.json"));
        assert!(local.location.starts_with("data"));
        assert_eq!(local.title, "Movie Sales");

        let remote = Dataset::Kickstarter.request(None);
        assert!(remote.location.starts_with("https://"));
        assert!(remote.location.ends_with("/kickstarter-funding-data.json"));
    }
}
