//! Trello boards used as action list or risk log, addressed by board id.

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::opener::{UrlRead, read_json};
use crate::source::MetricSource;

/// Public Trello API.
pub const TRELLO_API: &str = "https://api.trello.com/1/";

/// Days without activity after which a card is stale.
pub const INACTIVE_DAYS: i64 = 14;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Card {
    short_url: String,
    name: String,
    date_last_activity: Option<String>,
    due: Option<String>,
    id_list: String,
}

#[derive(Debug, Deserialize)]
struct List {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Board {
    url: String,
    date_last_activity: Option<String>,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default)]
    lists: Vec<List>,
}

/// A card with how late or how long untouched it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub url: String,
    pub name: String,
    pub delta: TimeDelta,
}

pub struct Trello {
    api: String,
    appkey: String,
    token: String,
    lists_to_ignore: Vec<String>,
    opener: Arc<dyn UrlRead>,
}

impl Trello {
    /// `api` defaults to the public Trello API when empty.
    pub fn new(
        api: &str,
        appkey: String,
        token: String,
        lists_to_ignore: Vec<String>,
        opener: Arc<dyn UrlRead>,
    ) -> Self {
        let api = match api {
            "" => TRELLO_API.to_string(),
            api if api.ends_with('/') => api.to_string(),
            api => format!("{api}/"),
        };
        Self {
            api,
            appkey,
            token,
            lists_to_ignore,
            opener,
        }
    }

    /// Lists whose cards are not counted.
    pub fn ignored_lists(&self) -> &[String] {
        &self.lists_to_ignore
    }

    fn board(&self, id: &str) -> Result<Board> {
        let url = format!(
            "{}boards/{id}/?fields=id,url,dateLastActivity&lists=open&list_fields=name&cards=visible\
             &card_fields=shortUrl,dateLastActivity,due,idList,name&key={}&token={}",
            self.api, self.appkey, self.token
        );
        read_json(self.opener.as_ref(), &url)
            .inspect_err(|err| warn!(board = %id, reason = %err, "Couldn't get data from Trello board"))
    }

    fn boards(&self, ids: &[&str]) -> Result<Vec<Board>> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        ids.iter().map(|id| self.board(id)).collect()
    }

    /// Cards on the boards, except those in ignored lists.
    fn cards(&self, ids: &[&str]) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        for board in self.boards(ids)? {
            let ignored: Vec<&str> = board
                .lists
                .iter()
                .filter(|list| self.lists_to_ignore.contains(&list.name))
                .map(|list| list.id.as_str())
                .collect();
            cards.extend(
                board
                    .cards
                    .into_iter()
                    .filter(|card| !ignored.contains(&card.id_list.as_str())),
            );
        }
        Ok(cards)
    }

    /// Cards whose due date has passed.
    pub fn over_due_cards(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<CardInfo>> {
        Ok(self
            .cards(ids)?
            .into_iter()
            .filter_map(|card| {
                let due = card.due.as_deref().and_then(parse_iso_datetime)?;
                (due < now).then(|| CardInfo {
                    url: card.short_url,
                    name: card.name,
                    delta: now - due,
                })
            })
            .collect())
    }

    /// Cards not due in the future and without activity for `days` days.
    pub fn inactive_cards(&self, ids: &[&str], now: NaiveDateTime, days: i64) -> Result<Vec<CardInfo>> {
        Ok(self
            .cards(ids)?
            .into_iter()
            .filter_map(|card| {
                let due = card.due.as_deref().and_then(parse_iso_datetime);
                if due.is_some_and(|due| due > now) {
                    return None;
                }
                let last = card.date_last_activity.as_deref().and_then(parse_iso_datetime)?;
                let idle = now - last;
                (idle > TimeDelta::days(days)).then(|| CardInfo {
                    url: card.short_url,
                    name: card.name,
                    delta: idle,
                })
            })
            .collect())
    }

    /// Most recent activity over all boards.
    pub fn last_activity(&self, ids: &[&str]) -> Result<NaiveDateTime> {
        self.boards(ids)?
            .iter()
            .filter_map(|board| board.date_last_activity.as_deref().and_then(parse_iso_datetime))
            .max()
            .ok_or_else(|| SourceError::Parse("no board activity".to_string()))
    }
}

impl MetricSource for Trello {
    fn kind(&self) -> SourceKind {
        SourceKind::Trello
    }

    fn url(&self) -> &str {
        "http://trello.com"
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                self.board(id)
                    .map_or_else(|_| self.url().to_string(), |board| board.url)
            })
            .collect()
    }
}
