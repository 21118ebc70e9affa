//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::content::Post;
use crate::filters;
use crate::routes::{Layout, not_found};
use crate::state::AppState;

/// Post view for templates.
#[derive(Clone)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: NaiveDate,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.meta.title.clone(),
            description: post.meta.description.clone(),
            author: post.meta.author.clone(),
            published_at: post.meta.published_at,
            featured_image: post.meta.featured_image.clone(),
            tags: post.meta.tags.clone(),
            content_html: post.content_html.clone(),
            reading_time_minutes: post.reading_time_minutes,
        }
    }
}

/// One step of the breadcrumb trail.
#[derive(Clone)]
pub struct BreadcrumbItem {
    pub name: String,
    pub url: Option<String>,
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub layout: Layout,
    pub posts: Vec<PostView>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub layout: Layout,
    pub post: PostView,
    pub recent_posts: Vec<PostView>,
    pub breadcrumbs: Vec<BreadcrumbItem>,
}

/// Number of recent posts to show in sidebar.
const RECENT_POSTS_COUNT: usize = 3;

/// Display the blog index page with all published posts.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let posts: Vec<PostView> = state
        .content()
        .published_posts()
        .map(PostView::from)
        .collect();

    BlogIndexTemplate {
        layout: Layout::new(
            &state,
            "Blog",
            "Printing and signage tips for UAE businesses.",
            "/blog",
        ),
        posts,
    }
}

/// Display a single blog post by slug.
///
/// Drafts answer 404.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(post) = state.content().post(&slug) else {
        return not_found(&state);
    };

    let recent_posts: Vec<PostView> = state
        .content()
        .recent_posts(RECENT_POSTS_COUNT, Some(&slug))
        .into_iter()
        .map(PostView::from)
        .collect();

    let post = PostView::from(post);

    let breadcrumbs = vec![
        BreadcrumbItem {
            name: "Home".to_string(),
            url: Some("/".to_string()),
        },
        BreadcrumbItem {
            name: "Blog".to_string(),
            url: Some("/blog".to_string()),
        },
        BreadcrumbItem {
            name: post.title.clone(),
            url: None,
        },
    ];

    BlogShowTemplate {
        layout: Layout::new(
            &state,
            &post.title,
            post.description.as_deref().unwrap_or_default(),
            &format!("/blog/{}", post.slug),
        ),
        post,
        recent_posts,
        breadcrumbs,
    }
    .into_response()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(index))
        .route("/blog/{slug}", get(show))
}
