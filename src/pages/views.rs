//! HTML rendering for the viewer and admin pages.

use std::fmt::Write as _;

use axum::http::StatusCode;
use uuid::Uuid;

use crate::badges::BadgeCatalog;
use crate::models::{CredentialInfo, NormalizedFlight, UserBadges};

/// Data the index page is rendered from.
pub struct IndexView<'a> {
    pub title: &'a str,
    pub mount: &'a str,
    pub admin_mode: bool,
    pub local_mode: bool,
    pub username: &'a str,
    pub flights: &'a [NormalizedFlight],
    pub badges: &'a UserBadges,
    pub catalog: &'a BadgeCatalog,
    pub credentials: Option<&'a [CredentialInfo]>,
}

/// Escape text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<link rel=\"stylesheet\" href=\"/static/style.css\">\n\
         </head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape(title),
        body = body
    )
}

pub fn index_page(view: &IndexView<'_>) -> String {
    let mut body = String::new();
    let mount = escape(view.mount);

    let _ = writeln!(
        body,
        "<p class=\"greeting\">Logged in as <strong>{}</strong></p>",
        escape(view.username)
    );

    body.push_str("<nav>");
    if view.admin_mode {
        let _ = write!(body, "<a href=\"{}/add_user\">Add user</a> ", mount);
    }
    if view.local_mode {
        let _ = write!(
            body,
            "<a href=\"{m}/upload\">Upload records</a> <a href=\"{m}/download\">Download records</a>",
            m = mount
        );
    }
    body.push_str("</nav>\n");

    let _ = writeln!(
        body,
        "<section class=\"badges\">\n<h2>Your badges ({} of {})</h2>\n<ul>",
        view.badges.badges.len(),
        view.catalog.iter().count()
    );
    for badge in view.catalog.iter() {
        let state = if view.badges.has(badge) {
            "collected"
        } else {
            "missing"
        };
        let asset = view.catalog.asset(badge).unwrap_or(badge);
        let _ = writeln!(
            body,
            "<li class=\"{state}\"><img src=\"/static/badges/{asset}\" alt=\"{b}\"> {b}</li>",
            state = state,
            asset = escape(asset),
            b = escape(badge)
        );
    }
    body.push_str("</ul>\n</section>\n");

    body.push_str("<section class=\"flights\">\n<h2>Flights nearby</h2>\n");
    if view.flights.is_empty() {
        body.push_str("<p>No flights around right now.</p>\n");
    } else {
        body.push_str("<ol>\n");
        for flight in view.flights {
            flight_item(&mut body, &mount, flight, view.badges);
        }
        body.push_str("</ol>\n");
    }
    body.push_str("</section>\n");

    if let Some(credentials) = view.credentials {
        credential_table(&mut body, credentials);
    }

    layout(view.title, &body)
}

fn flight_item(body: &mut String, mount: &str, flight: &NormalizedFlight, badges: &UserBadges) {
    let _ = writeln!(
        body,
        "<li class=\"flight\" data-flight-id=\"{id}\" data-rank=\"{rank}\">\n\
         <img src=\"{src}\" alt=\"{alt}\">\n\
         <h3>{model}</h3>\n\
         <p class=\"airline\">{airline}</p>\n\
         <p class=\"route\">{origin} &rarr; {destination}</p>\n\
         <p class=\"altitude\">{altitude} m</p>\n\
         <p class=\"distance\">{distance}</p>",
        id = escape(&flight.id),
        rank = flight.distance.rank_key(),
        src = escape(&flight.image.src),
        alt = escape(&flight.image.alt),
        model = escape(&flight.model),
        airline = escape(&flight.airline),
        origin = escape(&flight.origin),
        destination = escape(&flight.destination),
        altitude = flight.altitude,
        distance = flight.distance.value(),
    );

    if let Some(badge) = flight.badge {
        if badges.has(badge.as_str()) {
            let _ = writeln!(body, "<p class=\"badge collected\">{}</p>", badge);
        } else {
            let _ = writeln!(
                body,
                "<form method=\"post\" action=\"{mount}/badges/{badge}\">\
                 <button type=\"submit\">Collect {badge}</button></form>",
                mount = mount,
                badge = badge
            );
        }
    }
    body.push_str("</li>\n");
}

fn credential_table(body: &mut String, credentials: &[CredentialInfo]) {
    body.push_str("<section class=\"users\">\n<h2>Users</h2>\n<table>\n");
    body.push_str("<tr><th>Realm</th><th>Username</th><th>Created</th></tr>\n");
    for credential in credentials {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&credential.realm),
            escape(&credential.username),
            escape(&credential.created_at)
        );
    }
    body.push_str("</table>\n</section>\n");
}

pub fn upload_page(mount: &str) -> String {
    let body = format!(
        "<form method=\"post\" action=\"{}/upload_file\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"starting_data\" accept=\"application/json\">\n\
         <button type=\"submit\">Upload</button>\n</form>\n",
        escape(mount)
    );
    layout("Upload flight records", &body)
}

pub fn add_user_page(mount: &str, realms: &[&str]) -> String {
    let options: String = realms
        .iter()
        .map(|realm| format!("<option value=\"{r}\">{r}</option>", r = escape(realm)))
        .collect();
    let body = format!(
        "<form method=\"post\" action=\"{mount}/POST_USER\">\n\
         <label>Realm <select name=\"realm\">{options}</select></label>\n\
         <label>Username <input name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Add user</button>\n</form>\n",
        mount = escape(mount),
        options = options
    );
    layout("Add user", &body)
}

pub fn upload_done_page(mount: &str, batch_id: Uuid, inserted: usize) -> String {
    let mount = escape(mount);
    let body = format!(
        "<p>Stored {inserted} flight records</p>\n\
         <form method=\"post\" action=\"{mount}/upload/{batch_id}/delete\">\
         <button type=\"submit\">Undo upload</button></form>\n\
         <p><a href=\"{mount}\">Back</a></p>\n",
        inserted = inserted,
        mount = mount,
        batch_id = batch_id
    );
    layout("Upload complete", &body)
}

pub fn message_page(title: &str, message: &str, back: &str) -> String {
    let body = format!(
        "<p>{}</p>\n<p><a href=\"{}\">Back</a></p>\n",
        escape(message),
        escape(back)
    );
    layout(title, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!("<p class=\"error\">{}</p>\n", escape(message));
    layout(&title, &body)
}
