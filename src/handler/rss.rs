//! Handler for serving an rss feed
use chrono::{DateTime, NaiveDateTime, Utc};
use gotham::{
    helpers::http::response::create_response,
    state::{FromState, State},
};
use hyper::{Body, Response, StatusCode};
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::{
    config::Settings,
    db::DbConnection,
    post::{self, Entry, Scope},
};

/// Builds the feed item for a post, linking to `site_url`.
fn item(site_url: &str, entry: Entry) -> Result<Item, failure::Error> {
    let link = format!("{}{}", site_url, entry.post.url());
    let guid = GuidBuilder::default()
        .value(link.clone())
        .permalink(true)
        .build()
        .map_err(failure::err_msg)?;

    let mut categories = Vec::new();
    if let Some(category) = entry.shown_category() {
        let category = CategoryBuilder::default()
            .name(category.title.clone())
            .build()
            .map_err(failure::err_msg)?;
        categories.push(category);
    }

    ItemBuilder::default()
        .title(entry.post.title.clone())
        .link(link)
        .guid(guid)
        .author(entry.author.full_name())
        .categories(categories)
        .pub_date(date_format(entry.post.pub_date))
        .content(entry.post.html())
        .build()
        .map_err(failure::err_msg)
}

/// Encodes a date in [RFC822](https://www.w3.org/Protocols/rfc822/#z28) format.
fn date_format(date: NaiveDateTime) -> String {
    DateTime::<Utc>::from_utc(date, Utc)
        .format("%a, %d %b %Y %H:%M:%S %z")
        .to_string()
}

/// Serves an RSS encoded feed of the newest public posts
pub fn rss(state: &State) -> Result<Response<Body>, failure::Error> {
    let connection = &DbConnection::from_state(state)?;
    let site_url = &Settings::borrow_from(state).site_url;

    let entries = post::page(connection, Scope::Public, None)?.items;
    let last_change = entries.get(0).map(|entry| date_format(entry.post.pub_date));
    let items = entries
        .into_iter()
        .map(|entry| item(site_url, entry))
        .collect::<Result<Vec<Item>, _>>()?;

    let mut buf = Vec::new();
    let channel = ChannelBuilder::default()
        .title(env!("CARGO_PKG_NAME"))
        .link(site_url.as_str())
        .description(env!("CARGO_PKG_DESCRIPTION"))
        .last_build_date(last_change.clone())
        .pub_date(last_change)
        .items(items)
        .build()
        .map_err(failure::err_msg)?;
    channel.pretty_write_to(&mut buf, b' ', 4)?;

    let media_type: mime::Mime = "application/rss+xml".parse()?;
    Ok(create_response(state, StatusCode::OK, media_type, buf))
}
