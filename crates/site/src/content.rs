//! Site content: catalogue JSON plus markdown pages and blog posts.
//!
//! Everything is loaded once at startup from the content directory:
//!
//! ```text
//! content/
//!   site.json            business details, navigation, hero
//!   services.json        service catalogue
//!   products.json        product catalogue
//!   portfolio.json       past work
//!   testimonials.json    client quotes
//!   pages/*.md           about, terms, privacy (YAML front matter)
//!   blog/*.md            blog posts (YAML front matter)
//! ```

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use signpress_core::Price;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Business details and site-wide settings from `site.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub address: String,
    pub email: String,
    pub hours: String,
    pub map_url: Option<String>,
    pub social: Vec<Link>,
    pub nav: Vec<Link>,
    pub hero: Hero,
    pub emirates: Vec<String>,
}

/// A labelled link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

/// Home page hero block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hero {
    pub eyebrow: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub cta_label: String,
    pub cta_href: String,
    pub image: Option<String>,
}

/// A service the business offers.
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub slug: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

/// A product visitors can order.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub slug: String,
    pub name: String,
    pub category: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    /// List price per unit; absent for made-to-quote products.
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Product {
    /// Catalogue link filtered to this product's category.
    #[must_use]
    pub fn category_href(&self) -> String {
        category_href(&self.category)
    }

    /// Price label for cards and detail pages.
    #[must_use]
    pub fn price_label(&self) -> String {
        self.price
            .map_or_else(|| "Price on request".to_string(), |price| price.display())
    }
}

/// Catalogue link filtered to `category`.
#[must_use]
pub fn category_href(category: &str) -> String {
    format!("/products?category={}", urlencoding::encode(category))
}

/// A piece of past work.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioItem {
    pub title: String,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A client testimonial.
#[derive(Debug, Clone, Deserialize)]
pub struct Testimonial {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    pub quote: String,
    #[serde(default = "default_rating")]
    pub rating: u8,
}

const fn default_rating() -> u8 {
    5
}

/// Metadata for static pages (about, terms, privacy).
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// Metadata for blog posts.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// A rendered blog post.
#[derive(Debug, Clone)]
pub struct Post {
    pub slug: String,
    pub meta: PostMeta,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

#[derive(Debug)]
struct Catalogue {
    site: SiteInfo,
    services: Vec<Service>,
    products: Vec<Product>,
    portfolio: Vec<PortfolioItem>,
    testimonials: Vec<Testimonial>,
    pages: HashMap<String, Page>,
    posts: Vec<Post>,
}

/// All site content, held in memory and shared cheaply.
#[derive(Debug, Clone)]
pub struct ContentStore {
    inner: Arc<Catalogue>,
}

impl ContentStore {
    /// Load all content from `content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `site.json` is missing or any JSON file is malformed.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let site_path = content_dir.join("site.json");
        if !site_path.exists() {
            return Err(ContentError::Io(format!(
                "missing {}",
                site_path.display()
            )));
        }

        let site: SiteInfo = load_json(&site_path)?;
        let services: Vec<Service> = load_json_list(&content_dir.join("services.json"))?;
        let products: Vec<Product> = load_json_list(&content_dir.join("products.json"))?;
        let portfolio = load_json_list(&content_dir.join("portfolio.json"))?;
        let testimonials = load_json_list(&content_dir.join("testimonials.json"))?;
        let pages = load_pages(&content_dir.join("pages"))?;
        let posts = load_posts(&content_dir.join("blog"))?;

        tracing::info!(
            services = services.len(),
            products = products.len(),
            pages = pages.len(),
            posts = posts.len(),
            "Content loaded"
        );

        Ok(Self {
            inner: Arc::new(Catalogue {
                site,
                services,
                products,
                portfolio,
                testimonials,
                pages,
                posts,
            }),
        })
    }

    #[must_use]
    pub fn site(&self) -> &SiteInfo {
        &self.inner.site
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.inner.services
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.inner.products
    }

    #[must_use]
    pub fn portfolio(&self) -> &[PortfolioItem] {
        &self.inner.portfolio
    }

    #[must_use]
    pub fn testimonials(&self) -> &[Testimonial] {
        &self.inner.testimonials
    }

    /// Get a service by slug.
    #[must_use]
    pub fn service(&self, slug: &str) -> Option<&Service> {
        self.inner.services.iter().find(|s| s.slug == slug)
    }

    /// Get a product by slug.
    #[must_use]
    pub fn product(&self, slug: &str) -> Option<&Product> {
        self.inner.products.iter().find(|p| p.slug == slug)
    }

    /// Featured services, falling back to the first few.
    #[must_use]
    pub fn featured_services(&self, limit: usize) -> Vec<&Service> {
        featured(&self.inner.services, |s| s.featured, limit)
    }

    /// Featured products, falling back to the first few.
    #[must_use]
    pub fn featured_products(&self, limit: usize) -> Vec<&Product> {
        featured(&self.inner.products, |p| p.featured, limit)
    }

    /// Products in `category` (case-insensitive), or all of them.
    #[must_use]
    pub fn products_in(&self, category: Option<&str>) -> Vec<&Product> {
        self.inner
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
            .collect()
    }

    /// Distinct product categories in catalogue order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for product in &self.inner.products {
            if !categories.contains(&product.category.as_str()) {
                categories.push(&product.category);
            }
        }
        categories
    }

    /// Get a page by slug.
    #[must_use]
    pub fn page(&self, slug: &str) -> Option<&Page> {
        self.inner.pages.get(slug)
    }

    /// Get a published post by slug.
    #[must_use]
    pub fn post(&self, slug: &str) -> Option<&Post> {
        self.published_posts().find(|p| p.slug == slug)
    }

    /// Published posts, newest first.
    pub fn published_posts(&self) -> impl Iterator<Item = &Post> {
        self.inner.posts.iter().filter(|p| !p.meta.draft)
    }

    /// Recent published posts, optionally excluding a specific slug.
    #[must_use]
    pub fn recent_posts(&self, limit: usize, exclude_slug: Option<&str>) -> Vec<&Post> {
        self.published_posts()
            .filter(|p| exclude_slug.is_none_or(|s| p.slug != s))
            .take(limit)
            .collect()
    }
}

fn featured<T>(items: &[T], is_featured: impl Fn(&T) -> bool, limit: usize) -> Vec<&T> {
    let picked: Vec<&T> = items.iter().filter(|i| is_featured(i)).take(limit).collect();
    if picked.is_empty() {
        items.iter().take(limit).collect()
    } else {
        picked
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| ContentError::Json {
        file: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load a JSON array, treating a missing file as empty.
fn load_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ContentError> {
    if !path.exists() {
        tracing::warn!("Content file does not exist: {:?}", path);
        return Ok(Vec::new());
    }
    load_json(path)
}

fn load_pages(dir: &Path) -> Result<HashMap<String, Page>, ContentError> {
    let mut pages = HashMap::new();

    if !dir.exists() {
        tracing::warn!("Pages directory does not exist: {:?}", dir);
        return Ok(pages);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            match load_page(&path) {
                Ok(page) => {
                    tracing::debug!("Loaded page: {}", page.slug);
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => {
                    tracing::error!("Failed to load page {:?}: {}", path, e);
                }
            }
        }
    }

    Ok(pages)
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    let slug = file_slug(path)?.to_string();

    let (meta, body): (PageMeta, String) = parse_front_matter(&content)?;

    Ok(Page {
        slug,
        meta,
        content_html: render_markdown(&body),
    })
}

fn load_posts(dir: &Path) -> Result<Vec<Post>, ContentError> {
    let mut posts = Vec::new();

    if !dir.exists() {
        tracing::info!("Blog directory does not exist yet: {:?}", dir);
        return Ok(posts);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            match load_post(&path) {
                Ok(post) => {
                    tracing::debug!("Loaded post: {}", post.slug);
                    posts.push(post);
                }
                Err(e) => {
                    tracing::error!("Failed to load post {:?}: {}", path, e);
                }
            }
        }
    }

    posts.sort_by(|a, b| b.meta.published_at.cmp(&a.meta.published_at));

    Ok(posts)
}

fn load_post(path: &Path) -> Result<Post, ContentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    let slug = post_slug(file_slug(path)?).to_string();

    let (meta, body): (PostMeta, String) = parse_front_matter(&content)?;

    Ok(Post {
        slug,
        meta,
        content_html: render_markdown(&body),
        reading_time_minutes: reading_time(&body),
    })
}

fn file_slug(path: &Path) -> Result<&str, ContentError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))
}

/// Strip a `YYYY-MM-DD-` prefix from a post file name.
fn post_slug(stem: &str) -> &str {
    let date = stem.get(..10);
    let rest = stem.get(10..).and_then(|r| r.strip_prefix('-'));
    match (date, rest) {
        (Some(date), Some(rest))
            if !rest.is_empty() && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() =>
        {
            rest
        }
        _ => stem,
    }
}

fn parse_front_matter<T: DeserializeOwned>(content: &str) -> Result<(T, String), ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<T> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;
    Ok((meta, parsed.content))
}

/// Minutes to read at 200 words per minute, at least one.
fn reading_time(body: &str) -> u32 {
    let words = u32::try_from(body.split_whitespace().count()).unwrap_or(u32::MAX);
    words.div_ceil(200).max(1)
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());

    // Content is ours; allow inline HTML such as embedded maps.
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

/// Content loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid JSON in {file}: {message}")]
    Json { file: String, message: String },
}
