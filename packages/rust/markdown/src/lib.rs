//! Markdown-side text handling for KawaiiReview.
//!
//! - [`slug`]: title → URL-safe slug
//! - [`frontmatter`]: parse and render the `blog.md` metadata block
//! - [`html`]: body/synopsis rendering, chips, HTML stripping
//! - [`template`]: `{{ placeholder }}` substitution

pub mod frontmatter;
pub mod html;
pub mod slug;
pub mod template;

pub use frontmatter::{
    Frontmatter, REVIEW_PLACEHOLDER, ReviewFrontmatter, parse as parse_frontmatter,
    render_review, value_as_number,
};
pub use html::{chip_markup, escape_text, markdown_to_html, paragraphize, split_list, strip_html};
pub use slug::{FALLBACK_SLUG, slugify, suffixed, try_slugify};
pub use template::apply_template;
