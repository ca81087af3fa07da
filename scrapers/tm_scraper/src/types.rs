use serde::{Deserialize, Serialize};

pub const NO_TIER: &str = "Not Available";
pub const NO_COUNTRY_URL: &str = "";
pub const INTERNATIONAL_COUNTRY_NAME: &str = "International";
pub const DUMMY_ID_VALUE: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub country_id: i64,
    pub country_name: String,
    pub country_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub competition_name: String,
    pub competition_code: String,
    pub competition_url: String,
    pub competition_tier: String,
    pub country_name: String,
    pub country_id: i64,
    pub country_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitionKind {
    Cup,
    League,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub team_id: i64,
    pub team_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: i64,
    pub player_name: String,
    pub player_url: String,
}

/// A team as seen in one competition season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionSeasonTeam {
    pub competition_name: String,
    pub competition_code: String,
    pub season_name: String,
    pub team_id: i64,
    pub team_name: String,
    pub team_url: String,
}

impl CompetitionSeasonTeam {
    pub fn new(competition: &Competition, season_name: &str, team: Team) -> Self {
        Self {
            competition_name: competition.competition_name.clone(),
            competition_code: competition.competition_code.clone(),
            season_name: season_name.to_string(),
            team_id: team.team_id,
            team_name: team.team_name,
            team_url: team.team_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionSeasonTeamPlayer {
    pub competition_name: String,
    pub competition_code: String,
    pub season_name: String,
    pub team_id: i64,
    pub team_name: String,
    pub team_url: String,
    pub player_id: i64,
    pub player_name: String,
    pub player_url: String,
}

impl CompetitionSeasonTeamPlayer {
    pub fn new(team: &CompetitionSeasonTeam, player: Player) -> Self {
        Self {
            competition_name: team.competition_name.clone(),
            competition_code: team.competition_code.clone(),
            season_name: team.season_name.clone(),
            team_id: team.team_id,
            team_name: team.team_name.clone(),
            team_url: team.team_url.clone(),
            player_id: player.player_id,
            player_name: player.player_name,
            player_url: player.player_url,
        }
    }
}

/// One element of a JSON list stored in the session cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl CacheRecord {
    pub fn into_country(self) -> Option<Country> {
        Some(Country {
            country_id: self.id?,
            country_name: self.name?,
            country_url: self.link?,
        })
    }
}
