use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

use crate::config::Config;
use crate::coordinator::DirectoryCoordinator;
use directory_types::{
    CheckInRequest, CheckInResponse, CreatePlayerRequest, CreatePlayerResponse,
    ResolvePlayerIdsRequest, ResolvePlayerIdsResponse, ResultCode, SignInRequest, SignInResponse,
    SignOutRequest, StatusResponse,
};

pub mod config;
pub mod coordinator;
pub mod error;
pub mod validation;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn create_routes(
    coordinator: Arc<DirectoryCoordinator>,
    config: Arc<Config>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let coordinator_filter = warp::any().map({
        let coordinator = coordinator.clone();
        move || coordinator.clone()
    });

    let config_filter = warp::any().map({
        let config = config.clone();
        move || config.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let sign_in = warp::path("signin")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<SignInRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_sign_in);

    let sign_out = warp::path("signout")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<SignOutRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_sign_out);

    let create_player = warp::path("players")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<CreatePlayerRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_create_player);

    let resolve_players = warp::path!("players" / "resolve")
        .and(warp::post())
        .and(json_body::<ResolvePlayerIdsRequest>())
        .and(coordinator_filter.clone())
        .and(config_filter.clone())
        .and_then(handle_resolve_players);

    let check_in = warp::path!("servers" / "checkin")
        .and(warp::post())
        .and(warp::addr::remote())
        .and(json_body::<CheckInRequest>())
        .and(coordinator_filter.clone())
        .and_then(handle_check_in);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(sign_in)
        .or(sign_out)
        .or(resolve_players)
        .or(create_player)
        .or(check_in)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::log("game_directory"))
}

fn json_body<T: DeserializeOwned + Send>()
-> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// HTTP status for an outcome. The `result` field stays authoritative for
/// clients; the status only helps proxies and logs.
pub fn status_for(result: ResultCode) -> StatusCode {
    match result {
        ResultCode::Success => StatusCode::OK,
        ResultCode::RequestInvalid => StatusCode::BAD_REQUEST,
        ResultCode::AccountNotFound | ResultCode::ServerNotFound => StatusCode::NOT_FOUND,
        ResultCode::AlreadyLoggedInError | ResultCode::AccountAlreadyExists => {
            StatusCode::CONFLICT
        }
        ResultCode::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn envelope<T: Serialize>(body: &T, result: ResultCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(body), status_for(result))
}

fn request_invalid(operation: &str, reason: String) -> warp::reply::WithStatus<warp::reply::Json> {
    tracing::debug!("Rejected {} request: {}", operation, reason);
    envelope(
        &StatusResponse::new(ResultCode::RequestInvalid),
        ResultCode::RequestInvalid,
    )
}

async fn handle_sign_in(
    request: SignInRequest,
    coordinator: Arc<DirectoryCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(reason) = validation::validate_sign_in(&request) {
        return Ok(request_invalid("sign-in", reason));
    }

    let response = match coordinator
        .sign_in(
            &request.player_id,
            &request.version,
            request.hash,
            request.joining_id,
        )
        .await
    {
        Ok(grant) => SignInResponse::success(grant.last_sign_in, grant.server),
        Err(err) => SignInResponse::failure(err.code()),
    };

    Ok(envelope(&response, response.result))
}

async fn handle_sign_out(
    request: SignOutRequest,
    coordinator: Arc<DirectoryCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(reason) = validation::validate_sign_out(&request) {
        return Ok(request_invalid("sign-out", reason));
    }

    let result = match coordinator.sign_out(&request.player_id).await {
        Ok(()) => ResultCode::Success,
        Err(err) => err.code(),
    };

    Ok(envelope(&StatusResponse::new(result), result))
}

async fn handle_create_player(
    request: CreatePlayerRequest,
    coordinator: Arc<DirectoryCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(reason) = validation::validate_create_player(&request) {
        return Ok(request_invalid("create-player", reason));
    }

    let response = match coordinator
        .create_player(
            &request.name,
            request.region,
            &request.external_ids(),
            request.player_id,
        )
        .await
    {
        Ok(player_id) => CreatePlayerResponse {
            result: ResultCode::Success,
            player_id: Some(player_id),
        },
        Err(err) => CreatePlayerResponse {
            result: err.code(),
            player_id: None,
        },
    };

    Ok(envelope(&response, response.result))
}

async fn handle_resolve_players(
    request: ResolvePlayerIdsRequest,
    coordinator: Arc<DirectoryCoordinator>,
    config: Arc<Config>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(reason) = validation::validate_resolve(&request, config.max_resolve_batch) {
        return Ok(request_invalid("resolve", reason));
    }

    let response = match coordinator.resolve_player_ids(&request.external_ids).await {
        Ok(resolution) => ResolvePlayerIdsResponse {
            result: if resolution.any_resolved() {
                ResultCode::Success
            } else {
                ResultCode::AccountNotFound
            },
            player_ids: Some(resolution.player_ids),
        },
        Err(err) => ResolvePlayerIdsResponse {
            result: err.code(),
            player_ids: None,
        },
    };

    Ok(envelope(&response, response.result))
}

async fn handle_check_in(
    remote: Option<SocketAddr>,
    request: CheckInRequest,
    coordinator: Arc<DirectoryCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(reason) = validation::validate_check_in(&request) {
        return Ok(request_invalid("check-in", reason));
    }

    let Some(remote) = remote else {
        return Ok(request_invalid(
            "check-in",
            "caller address unavailable".to_string(),
        ));
    };

    let response = match coordinator
        .check_in_server(
            &remote.ip().to_string(),
            request.game_port,
            request.status_port,
            request.region,
            request.hash,
            request.server_id,
        )
        .await
    {
        Ok(server_id) => CheckInResponse {
            result: ResultCode::Success,
            server_id: Some(server_id),
        },
        Err(err) => CheckInResponse {
            result: err.code(),
            server_id: None,
        },
    };

    Ok(envelope(&response, response.result))
}

/// Turns body-shape rejections into a `RequestInvalid` envelope; everything
/// else (unknown path, wrong method) keeps warp's default handling.
async fn handle_rejection(
    rejection: warp::Rejection,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    let shape_error = rejection
        .find::<warp::filters::body::BodyDeserializeError>()
        .map(|err| err.to_string())
        .or_else(|| {
            rejection
                .find::<warp::reject::PayloadTooLarge>()
                .map(|err| err.to_string())
        })
        .or_else(|| {
            rejection
                .find::<warp::reject::UnsupportedMediaType>()
                .map(|err| err.to_string())
        })
        .or_else(|| {
            rejection
                .find::<warp::reject::LengthRequired>()
                .map(|err| err.to_string())
        });

    match shape_error {
        Some(reason) => Ok(request_invalid("malformed", reason)),
        None => Err(rejection),
    }
}
