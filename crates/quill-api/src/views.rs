//! Server-rendered pages. Every user-supplied string goes through [`escape`].

use std::fmt::Write;

use axum::response::Html;

use quill_types::models::Post;

use crate::error::ValidationError;
use crate::middleware::RequestIdentity;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(identity: &RequestIdentity, title: &str, error: Option<&ValidationError>, content: &str) -> Html<String> {
    let nav = match identity.user() {
        Some(user) => format!(
            "<li><span>{}</span></li>\n      <li><a href=\"/auth/logout\">Log Out</a></li>",
            escape(&user.username)
        ),
        None => "<li><a href=\"/auth/register\">Register</a></li>\n      <li><a href=\"/auth/login\">Log In</a></li>"
            .to_string(),
    };

    let flash = error
        .map(|e| format!("<div class=\"flash\">{}</div>\n  ", escape(&e.to_string())))
        .unwrap_or_default();

    Html(format!(
        "<!doctype html>
<title>{title} - Quill</title>
<nav>
  <h1><a href=\"/\">Quill</a></h1>
  <ul>
      {nav}
  </ul>
</nav>
<section class=\"content\">
  <header><h1>{title}</h1></header>
  {flash}{content}
</section>
",
        title = escape(title),
    ))
}

pub fn index(identity: &RequestIdentity, posts: &[Post]) -> Html<String> {
    let mut content = String::new();
    if identity.is_authenticated() {
        content.push_str("<a class=\"action\" href=\"/create\">New</a>\n");
    }

    for post in posts {
        let edit = match identity.user() {
            Some(user) if post.is_authored_by(user) => {
                format!("\n    <a class=\"action\" href=\"/{}/update\">Edit</a>", post.id)
            }
            _ => String::new(),
        };
        let _ = write!(
            content,
            "<article class=\"post\">
  <header>
    <div>
      <h1>{title}</h1>
      <div class=\"about\">by {author} on {date}</div>
    </div>{edit}
  </header>
  <p class=\"body\">{body}</p>
</article>
",
            title = escape(&post.title),
            author = escape(&post.author_username),
            date = post.created.format("%Y-%m-%d"),
            body = escape(&post.body),
        );
    }

    layout(identity, "Posts", None, &content)
}

fn credentials_form(action: &str, username: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">
    <label for=\"username\">Username</label>
    <input name=\"username\" id=\"username\" value=\"{username}\" required>
    <label for=\"password\">Password</label>
    <input type=\"password\" name=\"password\" id=\"password\" required>
    <input type=\"submit\" value=\"{submit}\">
  </form>",
        username = escape(username),
    )
}

pub fn register(identity: &RequestIdentity, username: &str, error: Option<&ValidationError>) -> Html<String> {
    layout(identity, "Register", error, &credentials_form("/auth/register", username, "Register"))
}

pub fn login(identity: &RequestIdentity, username: &str, error: Option<&ValidationError>) -> Html<String> {
    layout(identity, "Log In", error, &credentials_form("/auth/login", username, "Log In"))
}

fn post_form(action: &str, title: &str, body: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">
    <label for=\"title\">Title</label>
    <input name=\"title\" id=\"title\" value=\"{title}\" required>
    <label for=\"body\">Body</label>
    <textarea name=\"body\" id=\"body\">{body}</textarea>
    <input type=\"submit\" value=\"Save\">
  </form>",
        title = escape(title),
        body = escape(body),
    )
}

pub fn create(identity: &RequestIdentity, title: &str, body: &str, error: Option<&ValidationError>) -> Html<String> {
    layout(identity, "New Post", error, &post_form("/create", title, body))
}

pub fn update(
    identity: &RequestIdentity,
    post: &Post,
    title: &str,
    body: &str,
    error: Option<&ValidationError>,
) -> Html<String> {
    let mut content = post_form(&format!("/{}/update", post.id), title, body);
    let _ = write!(
        content,
        "
  <hr>
  <form method=\"post\" action=\"/{}/delete\">
    <input class=\"danger\" type=\"submit\" value=\"Delete\" onclick=\"return confirm('Are you sure?');\">
  </form>",
        post.id
    );
    layout(identity, &format!("Edit \"{}\"", post.title), error, &content)
}
