//! HTML rendering for post pages and listing cards.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating:
//! every interpolated value is escaped, so generated titles and summaries can't
//! inject markup. The only pre-escaped content is the post body, which comes
//! out of the Markdown renderer.
//!
//! Post pages are self-contained: styles are inlined (Tailwind and the Inter
//! font come from their CDNs) and every link is absolute, so a page works no
//! matter which other pages exist.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};

/// Target used when a row's link isn't a usable absolute URL.
pub const CTA_FALLBACK: &str = "#";

const POST_CSS: &str = r#"
body {
    font-family: 'Inter', sans-serif;
    background-color: #f8fafc;
    line-height: 1.6;
    color: #333;
}
.blog-content h1, .blog-content h2, .blog-content h3 {
    margin-top: 1.5em;
    margin-bottom: 0.5em;
    font-weight: 600;
}
.blog-content p { margin-bottom: 1em; }
.blog-content ul, .blog-content ol {
    margin-left: 1.5em;
    margin-bottom: 1em;
    list-style-type: disc;
}
.blog-content ol { list-style-type: decimal; }
.cta-container {
    margin-top: 2.5rem;
    margin-bottom: 2.5rem;
    text-align: center;
}
.cta-button {
    display: inline-block;
    background-color: #ef4444;
    color: white;
    padding: 1rem 2rem;
    border-radius: 0.75rem;
    font-size: 1.25rem;
    font-weight: 700;
    text-decoration: none;
    box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
    transition: background-color 0.3s ease, transform 0.2s ease;
}
.cta-button:hover {
    background-color: #dc2626;
    transform: translateY(-2px);
}
"#;

/// Everything a post page shows.
#[derive(Debug, Clone)]
pub struct PostPage<'a> {
    pub title: &'a str,
    /// Markdown.
    pub body: &'a str,
    pub image_url: &'a str,
    /// Row link, unvalidated. See [`cta_target`].
    pub cta_link: Option<&'a str>,
    pub author: &'a str,
    /// Already formatted for display, e.g. "March 04, 2025".
    pub date: &'a str,
    pub year: i32,
    pub brand: &'a str,
    /// Site root URL without trailing slash, for the Home/Blog links.
    pub base_url: &'a str,
    /// File name of the listing page, e.g. `blog.html`.
    pub listing_file: &'a str,
}

/// Everything a listing card shows.
#[derive(Debug, Clone)]
pub struct ListingCard<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub image_url: &'a str,
    pub post_url: &'a str,
    pub cta_link: Option<&'a str>,
    pub author: &'a str,
    pub date: &'a str,
}

/// Call-to-action href: the link itself when it's an absolute http(s) URL,
/// [`CTA_FALLBACK`] otherwise.
pub fn cta_target(link: Option<&str>) -> String {
    link.map(str::trim)
        .and_then(|l| url::Url::parse(l).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .map(String::from)
        .unwrap_or_else(|| CTA_FALLBACK.to_string())
}

/// Convert Markdown to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

/// Render a full post page.
pub fn render_post(page: &PostPage<'_>) -> String {
    let blog_url = format!("{}/{}", page.base_url, page.listing_file);
    let home_url = format!("{}/index.html", page.base_url);
    let body_html = markdown_to_html(page.body);
    let cta = cta_target(page.cta_link);

    let content = html! {
        (site_header(page.brand, &home_url, &blog_url))
        main class="flex-grow container mx-auto px-4 py-8 md:py-12 max-w-3xl" {
            article class="bg-white rounded-xl shadow-lg p-8" {
                h1 class="text-4xl font-extrabold text-gray-900 mb-4" { (page.title) }
                div class="text-gray-500 text-sm mb-6" {
                    span { "By : " (page.author) }
                    " " (PreEscaped("&bull;")) " "
                    span { (page.date) }
                }
                img class="w-full rounded-lg mb-8 object-cover max-h-96"
                    src=(page.image_url) alt={ (page.title) " image" };
                div class="blog-content text-gray-700 text-lg" {
                    (PreEscaped(body_html))
                }
                div class="cta-container" {
                    a class="cta-button" href=(cta) target="_blank" rel="noopener noreferrer" {
                        "Click Here for the Best Deal!"
                    }
                }
                div class="mt-8 text-center" {
                    a class="inline-block bg-blue-600 text-white px-6 py-3 rounded-lg" href=(blog_url) {
                        "Back to Blog"
                    }
                }
            }
        }
        (site_footer(page.brand, page.year))
    };

    base_document(page.title, content).into_string()
}

/// Render a listing card, ready to splice into the listing page.
///
/// The markup is wrapped in marker comments and indented to sit inside the
/// listing's card container.
pub fn render_card(card: &ListingCard<'_>) -> String {
    let cta = cta_target(card.cta_link);
    let markup = html! {
        div class="bg-white rounded-xl shadow-lg overflow-hidden" {
            img class="w-full h-48 object-cover" src=(card.image_url) alt={ (card.title) " image" };
            div class="p-6 flex flex-col" {
                h2 class="text-xl font-semibold text-gray-800 mb-2" { (card.title) }
                p class="text-gray-600 text-sm mb-4 flex-grow" { (card.summary) }
                div class="flex items-center text-gray-500 text-xs mb-4" {
                    span class="mr-3" { "By : " (card.author) }
                    span { (card.date) }
                }
                div class="flex justify-center space-x-4 mt-4" {
                    a class="inline-block bg-red-500 text-white font-bold py-2 px-4 rounded-lg text-sm"
                        href=(cta) target="_blank" rel="noopener noreferrer" { "Shop Now!" }
                    a class="inline-block bg-blue-600 text-white px-5 py-2 rounded-lg font-medium"
                        href=(card.post_url) { "Read More" }
                }
            }
        }
    };
    let comment_title = comment_safe(card.title);
    format!(
        "            <!-- Automated Blog Post Card - {comment_title} -->\n            {}\n            <!-- End Automated Blog Post Card -->\n",
        markup.into_string()
    )
}

/// HTML comments can't contain `--`.
fn comment_safe(text: &str) -> String {
    let mut out = text.replace("--", "- -");
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    out
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                script src="https://cdn.tailwindcss.com" {}
                link href="https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap" rel="stylesheet";
                style { (PreEscaped(POST_CSS)) }
            }
            body class="flex flex-col min-h-screen" {
                (content)
            }
        }
    }
}

fn site_header(brand: &str, home_url: &str, blog_url: &str) -> Markup {
    html! {
        header class="bg-white shadow-md py-4 px-6" {
            div class="container mx-auto flex justify-between items-center" {
                h1 style="font-size: 20px;" { (brand) }
                nav {
                    ul class="flex space-x-4" {
                        li { a class="text-gray-600 font-medium" href=(home_url) { "Home" } }
                        li { a class="text-blue-600 font-medium" href=(blog_url) { "Blog" } }
                    }
                }
            }
        }
    }
}

fn site_footer(brand: &str, year: i32) -> Markup {
    html! {
        footer class="bg-gray-800 text-white py-6 px-4 mt-8" {
            div class="container mx-auto text-center text-sm" {
                p { (PreEscaped("&copy;")) " " (year) " " (brand) ". All rights reserved." }
            }
        }
    }
}
