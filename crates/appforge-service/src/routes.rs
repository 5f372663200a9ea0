use crate::handlers;
use crate::reply;
use crate::state::ServiceState;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

const BODY_LIMIT: u64 = 256 * 1024;

fn with_state(
    state: ServiceState,
) -> impl Filter<Extract = (ServiceState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

/// Every API route, with rejections mapped to `{message}` bodies
pub fn routes(
    state: ServiceState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let generate = warp::path!("api" / "generate-app")
        .and(warp::post())
        .and(json_body::<handlers::GenerateBody>())
        .and(with_state(state.clone()))
        .and_then(handlers::generate_app);

    let create = warp::path!("api" / "apps")
        .and(warp::post())
        .and(json_body::<handlers::CreateBody>())
        .and(with_state(state.clone()))
        .and_then(handlers::create_app);

    let list = warp::path!("api" / "apps")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_apps);

    let get = warp::path!("api" / "apps" / Uuid)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_app);

    let update = warp::path!("api" / "apps" / Uuid)
        .and(warp::patch())
        .and(json_body::<handlers::StatusBody>())
        .and(with_state(state.clone()))
        .and_then(handlers::update_status);

    let delete = warp::path!("api" / "apps" / Uuid)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_app);

    let runtime = warp::path!("api" / "apps" / Uuid / "runtime")
        .and(warp::get())
        .and(warp::query::<handlers::RuntimeQuery>())
        .and(with_state(state))
        .and_then(handlers::runtime_document);

    generate
        .or(create)
        .or(list)
        .or(get)
        .or(update)
        .or(delete)
        .or(runtime)
        .recover(reply::recover)
        .with(warp::trace::request())
}

/// Bind `addr` and serve until `shutdown` resolves
///
/// # Errors
/// Returns [`warp::Error`] if the address cannot be bound
pub async fn serve<S>(state: ServiceState, addr: SocketAddr, shutdown: S) -> Result<(), warp::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!(%bound, "appforge service listening");
    server.await;
    tracing::info!("appforge service stopped");
    Ok(())
}
