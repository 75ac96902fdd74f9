use regex::Regex;
use std::sync::LazyLock;

use directory_types::{
    CheckInRequest, CreatePlayerRequest, ExternalIds, ResolvePlayerIdsRequest, SignInRequest,
    SignOutRequest,
};

const MAX_EXTERNAL_ID_LENGTH: usize = 64;
const MAX_VERSION_LENGTH: usize = 32;
const MAX_PLAYER_ID_LENGTH: usize = 64;

static PLAYER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 _-]{1,32}$").expect("player name pattern is valid")
});

/// Shape rules serde cannot express. Requests failing these never reach the
/// coordinator.
pub type ValidationResult = Result<(), String>;

pub fn validate_sign_in(request: &SignInRequest) -> ValidationResult {
    validate_player_id_field(&request.player_id)?;

    if request.version.trim().is_empty() {
        return Err("version must not be empty".to_string());
    }
    if request.version.len() > MAX_VERSION_LENGTH {
        return Err(format!(
            "version longer than {} characters",
            MAX_VERSION_LENGTH
        ));
    }

    Ok(())
}

pub fn validate_sign_out(request: &SignOutRequest) -> ValidationResult {
    validate_player_id_field(&request.player_id)
}

pub fn validate_create_player(request: &CreatePlayerRequest) -> ValidationResult {
    if !PLAYER_NAME.is_match(&request.name) {
        return Err("name must be 1-32 letters, digits, spaces, '_' or '-'".to_string());
    }
    if request.name.trim().is_empty() {
        return Err("name must not be blank".to_string());
    }

    let external_ids = request.external_ids();
    if external_ids.is_empty() {
        return Err("at least one of steamId or discordId is required".to_string());
    }
    validate_external_ids(&external_ids)
}

pub fn validate_resolve(request: &ResolvePlayerIdsRequest, max_batch: usize) -> ValidationResult {
    if request.external_ids.is_empty() {
        return Err("externalIds must not be empty".to_string());
    }
    if request.external_ids.len() > max_batch {
        return Err(format!("at most {} externalIds per request", max_batch));
    }

    request.external_ids.iter().try_for_each(validate_external_ids)
}

pub fn validate_check_in(request: &CheckInRequest) -> ValidationResult {
    if request.game_port == 0 {
        return Err("gamePort must be non-zero".to_string());
    }
    if request.status_port == Some(0) {
        return Err("statusPort must be non-zero".to_string());
    }
    Ok(())
}

fn validate_player_id_field(player_id: &str) -> ValidationResult {
    if player_id.is_empty() || player_id.len() > MAX_PLAYER_ID_LENGTH {
        return Err("playerId has an invalid length".to_string());
    }
    Ok(())
}

fn validate_external_ids(external_ids: &ExternalIds) -> ValidationResult {
    for id in [&external_ids.steam_id, &external_ids.discord_id]
        .into_iter()
        .flatten()
    {
        if id.is_empty() || id.len() > MAX_EXTERNAL_ID_LENGTH {
            return Err(format!(
                "external ids must be 1-{} characters",
                MAX_EXTERNAL_ID_LENGTH
            ));
        }
    }
    Ok(())
}
