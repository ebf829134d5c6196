use std::io;
use std::sync::Arc;

use chrono::Utc;
use ntex::web;
use ntex_files::NamedFile;
use serde_json::json;
use spdlog::{error, info, warn};

use crate::analytics::{AnalyticsEvent, AnalyticsSink, HttpSink};
use crate::config::Config;
use crate::locale::{Locale, DEFAULT_LOCALE};
use crate::post_repository::PostRepository;
use crate::projects::projects_for_locale;
use crate::view::sitemap_renderer::SitemapRenderer;

struct AppState {
    repository: PostRepository,
    sink: Option<Box<dyn AnalyticsSink>>,
    config: Config,
}

fn not_found(reason: &str) -> web::HttpResponse {
    web::HttpResponse::NotFound().json(&json!({ "error": reason }))
}

#[web::get("/")]
async fn index() -> web::HttpResponse {
    web::HttpResponse::TemporaryRedirect()
        .header("Location", format!("/{}", DEFAULT_LOCALE))
        .finish()
}

#[web::get("/{locale}/posts")]
async fn list_posts(
    path: web::types::Path<String>,
    state: web::types::State<Arc<AppState>>,
) -> web::HttpResponse {
    let locale_code = path.into_inner();
    let Some(locale) = Locale::parse(&locale_code) else {
        return not_found("Locale not found");
    };

    web::HttpResponse::Ok().json(&state.repository.all_posts(locale))
}

#[web::get("/{locale}/posts/{slug}")]
async fn view_post(
    path: web::types::Path<(String, String)>,
    state: web::types::State<Arc<AppState>>,
) -> web::HttpResponse {
    let (locale_code, slug) = path.into_inner();
    let Some(locale) = Locale::parse(&locale_code) else {
        return not_found("Locale not found");
    };

    match state.repository.post_by_slug(&slug, locale) {
        Some(entry) => web::HttpResponse::Ok().json(&json!({
            "metadata": &entry.metadata,
            "content": &entry.html,
            "toc": &entry.toc,
            "availableLocales": state.repository.available_locales(&slug),
        })),
        None => not_found("Post not found"),
    }
}

#[web::get("/{locale}/projects")]
async fn list_projects(path: web::types::Path<String>) -> web::HttpResponse {
    let locale_code = path.into_inner();
    let Some(locale) = Locale::parse(&locale_code) else {
        return not_found("Locale not found");
    };

    web::HttpResponse::Ok().json(&projects_for_locale(locale))
}

/// The endpoint is a pure translation layer in front of the write-only
/// sink: shape-check, normalize, forward once. Internal failure detail
/// never reaches the client.
async fn handle_analytics(sink: Option<&dyn AnalyticsSink>, body: &str) -> web::HttpResponse {
    let Some(sink) = sink else {
        return web::HttpResponse::ServiceUnavailable()
            .json(&json!({ "error": "Analytics not available" }));
    };

    let event: AnalyticsEvent = match serde_json::from_str(body) {
        Ok(event) => event,
        Err(e) => {
            return web::HttpResponse::BadRequest()
                .json(&json!({ "error": format!("Invalid analytics payload: {}", e) }));
        }
    };

    match sink.write_data_point(&event.normalize()).await {
        Ok(()) => web::HttpResponse::Ok().json(&json!({ "success": true })),
        Err(e) => {
            error!("Analytics error: {}", e);
            web::HttpResponse::InternalServerError()
                .json(&json!({ "error": "Failed to process analytics" }))
        }
    }
}

#[web::post("/api/analytics")]
async fn ingest_analytics(
    body: String,
    state: web::types::State<Arc<AppState>>,
) -> web::HttpResponse {
    handle_analytics(state.sink.as_deref(), &body).await
}

#[web::get("/robots.txt")]
async fn robots(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let base_url = state.config.site.base_url.trim_end_matches('/');
    let body = format!(
        "User-agent: *\nAllow: /\n\n# Sitemap\nSitemap: {}/sitemap.xml\n\n# Crawl delay\nCrawl-delay: 10\n",
        base_url
    );

    web::HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .header("Cache-Control", "max-age=3600")
        .body(body)
}

#[web::get("/sitemap.xml")]
async fn sitemap(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let renderer = SitemapRenderer {
        base_url: &state.config.site.base_url,
    };

    match renderer.render(&state.repository, Utc::now().date_naive()) {
        Ok(xml) => web::HttpResponse::Ok()
            .content_type("application/xml")
            .header("Cache-Control", "max-age=3600")
            .body(xml),
        Err(e) => {
            error!("Error rendering sitemap: {}", e);
            web::HttpResponse::InternalServerError().body("Error rendering sitemap")
        }
    }
}

#[web::get("/public/{file_name}")]
async fn public_files(
    path: web::types::Path<String>,
    state: web::types::State<Arc<AppState>>,
) -> Result<NamedFile, web::Error> {
    if path.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let repository = PostRepository::build(&config.paths.posts_dir)?;
    for locale in Locale::ALL {
        info!("{}: {} posts", locale, repository.all_posts(locale).len());
    }

    let sink: Option<Box<dyn AnalyticsSink>> = match config.analytics {
        Some(ref analytics) => match HttpSink::from_config(analytics) {
            Ok(sink) => Some(Box::new(sink)),
            Err(e) => {
                warn!("Analytics sink disabled: {}", e);
                None
            }
        },
        None => {
            info!("Analytics sink not configured");
            None
        }
    };

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(AppState {
        repository,
        sink,
        config,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(robots)
            .service(sitemap)
            .service(ingest_analytics)
            .service(public_files)
            .service(list_posts)
            .service(view_post)
            .service(list_projects)
    })
    .bind((bind_addr, bind_port))?
    .run()
    .await
}
