//! To-do list core: an ordered list of items kept in sync with a local JSON file.
//! The core stays free of presentation types; front ends drive it through the
//! list controller and the detail editor, and observe it through `ListEvent`s.

pub mod core {
    use chrono::{DateTime, Duration, Utc};
    use serde::{Deserialize, Serialize};

    /// Hours between "now" and the due date of a freshly created item.
    pub const DEFAULT_DUE_OFFSET_HOURS: i64 = 24;

    /* ------------------------------ Entities ------------------------------ */

    /// One to-do record.
    ///
    /// Items carry no identifier: a row is whatever sits at a given index of the
    /// owning [`ToDoList`], so every operation addresses items by position.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ToDoItem {
        pub name: String,
        /// Due date; doubles as the reminder time when `reminder_set` is on.
        pub date: DateTime<Utc>,
        pub notes: String,
        pub reminder_set: bool,
        pub completed: bool,
    }

    impl ToDoItem {
        pub fn new(name: impl Into<String>, date: DateTime<Utc>) -> Self {
            Self {
                name: name.into(),
                date,
                notes: String::new(),
                reminder_set: false,
                completed: false,
            }
        }

        /// Blank item offered when the user starts adding a new entry.
        pub fn draft(now: DateTime<Utc>) -> Self {
            Self::new("", now + Duration::hours(DEFAULT_DUE_OFFSET_HOURS))
        }
    }

    /* ------------------------------ Aggregate ------------------------------ */

    /// Ordered list of items; position is display order.
    ///
    /// Serializes as a bare JSON array. Mutations here are pure; persistence is
    /// layered on top by `store::ItemStore`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ToDoList {
        items: Vec<ToDoItem>,
    }

    impl ToDoList {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn items(&self) -> &[ToDoItem] {
            &self.items
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }

        pub fn get(&self, index: usize) -> Option<&ToDoItem> {
            self.items.get(index)
        }

        /// Append at the end and return the new item's index.
        pub fn push(&mut self, item: ToDoItem) -> usize {
            self.items.push(item);
            self.items.len() - 1
        }

        pub fn remove(&mut self, index: usize) -> Result<ToDoItem, DomainError> {
            self.check(index)?;
            Ok(self.items.remove(index))
        }

        /// Drag-reorder: `to` is read against the list with the moved item already
        /// taken out, so both indices must be below the current length.
        pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
            self.check(from)?;
            self.check(to)?;
            if from != to {
                let item = self.items.remove(from);
                self.items.insert(to, item);
            }
            Ok(())
        }

        /// Overwrite the item at `index`, returning the previous value.
        pub fn replace(&mut self, index: usize, item: ToDoItem) -> Result<ToDoItem, DomainError> {
            self.check(index)?;
            Ok(std::mem::replace(&mut self.items[index], item))
        }

        fn check(&self, index: usize) -> Result<(), DomainError> {
            if index < self.items.len() {
                Ok(())
            } else {
                Err(DomainError::IndexOutOfRange {
                    index,
                    len: self.items.len(),
                })
            }
        }
    }

    impl From<Vec<ToDoItem>> for ToDoList {
        fn from(items: Vec<ToDoItem>) -> Self {
            Self { items }
        }
    }

    /* ---------------------------- Errors (domain) ---------------------------- */

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum DomainError {
        #[error("index {index} is out of range for a list of {len} item(s)")]
        IndexOutOfRange { index: usize, len: usize },
        #[error("an item needs a non-empty name before it can be saved")]
        EmptyName,
        #[error("items cannot be added while the list is in edit mode")]
        AddWhileEditing,
    }

}

pub mod storage {
    //! Backing file for the list.
    //!
    //! The repository reports every failure; deciding which failures are
    //! recoverable is left to `store::ItemStore`.

    use super::core::ToDoList;
    use std::{
        fs, io,
        path::{Path, PathBuf},
    };
    use tracing::debug;

    /// Directory created under the platform data directory.
    pub const APP_DIR_NAME: &str = "todolist";
    pub const DATA_FILE_NAME: &str = "todos.json";

    #[derive(Debug, thiserror::Error)]
    pub enum PersistError {
        #[error("I/O error on {path:?}: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: io::Error,
        },
        #[error("malformed JSON in {path:?}: {source}")]
        Json {
            path: PathBuf,
            #[source]
            source: serde_json::Error,
        },
    }

    /// Where the list lives between runs.
    pub trait ItemRepository {
        /// Read the saved list. `Ok(None)` means nothing has been saved yet.
        fn read(&self) -> Result<Option<ToDoList>, PersistError>;

        /// Replace the saved list with `list`.
        fn write(&self, list: &ToDoList) -> Result<(), PersistError>;
    }

    /// JSON array on disk, rewritten in full on every save.
    #[derive(Debug, Clone)]
    pub struct JsonFileRepository {
        path: PathBuf,
    }

    impl JsonFileRepository {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn io_err(&self, source: io::Error) -> PersistError {
            PersistError::Io {
                path: self.path.clone(),
                source,
            }
        }
    }

    impl ItemRepository for JsonFileRepository {
        fn read(&self) -> Result<Option<ToDoList>, PersistError> {
            let text = match fs::read_to_string(&self.path) {
                Ok(text) => text,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(self.io_err(err)),
            };
            let list = serde_json::from_str(&text).map_err(|source| PersistError::Json {
                path: self.path.clone(),
                source,
            })?;
            Ok(Some(list))
        }

        fn write(&self, list: &ToDoList) -> Result<(), PersistError> {
            let json = serde_json::to_vec_pretty(list).map_err(|source| PersistError::Json {
                path: self.path.clone(),
                source,
            })?;
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
            // Write beside the target then rename over it.
            let tmp = temp_path_for(&self.path);
            if let Err(err) = fs::write(&tmp, &json).and_then(|()| fs::rename(&tmp, &self.path)) {
                let _ = fs::remove_file(&tmp);
                return Err(self.io_err(err));
            }
            debug!(path = %self.path.display(), bytes = json.len(), "wrote list");
            Ok(())
        }
    }

    fn temp_path_for(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DATA_FILE_NAME.to_string());
        path.with_file_name(format!(".{name}.tmp"))
    }

    /* ---------------------------- Configuration ---------------------------- */

    /// Default location: `<data dir>/todolist/todos.json`.
    pub fn default_data_file() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(DATA_FILE_NAME))
    }

    /// An explicit path wins; otherwise fall back to the platform default.
    pub fn resolve_data_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(default_data_file)
    }

}

pub mod store {
    //! Authoritative in-memory list plus save-on-mutation.

    use super::core::{DomainError, ToDoItem, ToDoList};
    use super::storage::ItemRepository;
    use tracing::{debug, error, warn};

    /// Load the saved list. Missing or unreadable files yield an empty list;
    /// only the log hears about it.
    pub fn load_items<R: ItemRepository + ?Sized>(repo: &R) -> ToDoList {
        match repo.read() {
            Ok(Some(list)) => {
                debug!(count = list.len(), "loaded saved items");
                list
            }
            Ok(None) => {
                debug!("no saved items yet");
                ToDoList::new()
            }
            Err(err) => {
                warn!(error = %err, "could not load saved items; starting empty");
                ToDoList::new()
            }
        }
    }

    /// Persist `list`, logging instead of returning any failure. Returns whether
    /// the write went through.
    pub fn save_items<R: ItemRepository + ?Sized>(repo: &R, list: &ToDoList) -> bool {
        match repo.write(list) {
            Ok(()) => {
                debug!(count = list.len(), "saved items");
                true
            }
            Err(err) => {
                error!(error = %err, "could not save items");
                false
            }
        }
    }

    /// Item store: the list as loaded at startup, flushed after every change.
    pub struct ItemStore<R: ItemRepository> {
        repo: R,
        list: ToDoList,
        persisted: bool,
    }

    impl<R: ItemRepository> ItemStore<R> {
        /// Load from `repo`; the store is usable whatever the file's state.
        pub fn open(repo: R) -> Self {
            let list = load_items(&repo);
            Self {
                repo,
                list,
                persisted: true,
            }
        }

        pub fn items(&self) -> &[ToDoItem] {
            self.list.items()
        }

        pub fn list(&self) -> &ToDoList {
            &self.list
        }

        pub fn get(&self, index: usize) -> Option<&ToDoItem> {
            self.list.get(index)
        }

        pub fn len(&self) -> usize {
            self.list.len()
        }

        pub fn is_empty(&self) -> bool {
            self.list.is_empty()
        }

        /// False after a failed save, until a later save succeeds.
        pub fn is_persisted(&self) -> bool {
            self.persisted
        }

        pub fn repository(&self) -> &R {
            &self.repo
        }

        /// Flush the whole list to the repository.
        pub fn save(&mut self) -> bool {
            self.persisted = save_items(&self.repo, &self.list);
            self.persisted
        }

        pub fn insert(&mut self, item: ToDoItem) -> usize {
            let index = self.list.push(item);
            self.save();
            index
        }

        pub fn delete(&mut self, index: usize) -> Result<ToDoItem, DomainError> {
            let removed = self.list.remove(index)?;
            self.save();
            Ok(removed)
        }

        pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
            self.list.move_item(from, to)?;
            self.save();
            Ok(())
        }

        pub fn replace(&mut self, index: usize, item: ToDoItem) -> Result<ToDoItem, DomainError> {
            let previous = self.list.replace(index, item)?;
            self.save();
            Ok(previous)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::storage::{JsonFileRepository, PersistError};
        use chrono::{TimeZone, Utc};
        use proptest::prelude::*;
        use std::{fs, io, path::PathBuf};

        fn item(name: &str) -> ToDoItem {
            ToDoItem::new(name, Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap())
        }

        fn names<R: ItemRepository>(store: &ItemStore<R>) -> Vec<String> {
            store.items().iter().map(|i| i.name.clone()).collect()
        }

        fn reopen(path: &PathBuf) -> ItemStore<JsonFileRepository> {
            ItemStore::open(JsonFileRepository::new(path))
        }

        struct BrokenDisk;

        impl ItemRepository for BrokenDisk {
            fn read(&self) -> Result<Option<ToDoList>, PersistError> {
                Err(PersistError::Io {
                    path: PathBuf::from("/broken"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                })
            }

            fn write(&self, _list: &ToDoList) -> Result<(), PersistError> {
                Err(PersistError::Io {
                    path: PathBuf::from("/broken"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                })
            }
        }

        #[test]
        fn buy_milk_scenario_round_trips() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("todos.json");
            let mut store = reopen(&path);
            assert!(store.is_empty());

            let milk = ToDoItem::new("Buy milk", Utc.timestamp_opt(1_760_000_000, 500_000_000).unwrap());
            assert_eq!(store.insert(milk.clone()), 0);
            assert_eq!(store.items(), std::slice::from_ref(&milk));

            let reloaded = reopen(&path);
            assert_eq!(reloaded.items(), std::slice::from_ref(&milk));
        }

        #[test]
        fn every_mutation_is_flushed() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("todos.json");
            let mut store = reopen(&path);
            store.insert(item("A"));
            store.insert(item("B"));
            store.insert(item("C"));
            assert_eq!(names(&reopen(&path)), ["A", "B", "C"]);

            store.move_item(0, 2).expect("move");
            assert_eq!(names(&reopen(&path)), ["B", "C", "A"]);

            store.delete(1).expect("delete");
            assert_eq!(names(&reopen(&path)), ["B", "A"]);

            let mut edited = item("B!");
            edited.completed = true;
            store.replace(0, edited.clone()).expect("replace");
            let reloaded = reopen(&path);
            assert_eq!(reloaded.get(0), Some(&edited));
            assert_eq!(names(&reloaded), ["B!", "A"]);
        }

        #[test]
        fn failed_index_operations_do_not_touch_file() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("todos.json");
            let mut store = reopen(&path);
            store.insert(item("A"));
            let before = fs::read_to_string(&path).expect("read");

            assert!(store.delete(4).is_err());
            assert!(store.move_item(0, 1).is_err());
            assert!(store.replace(1, item("Z")).is_err());

            assert_eq!(names(&store), ["A"]);
            assert_eq!(fs::read_to_string(&path).expect("read"), before);
        }

        #[test]
        fn corrupt_file_loads_empty_and_is_overwritten_on_next_save() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("todos.json");
            fs::write(&path, "[{\"name\": 3}]").expect("seed");

            let mut store = reopen(&path);
            assert!(store.is_empty());
            store.insert(item("fresh"));
            assert_eq!(names(&reopen(&path)), ["fresh"]);
        }

        #[test]
        fn save_failure_keeps_memory_as_truth() {
            let mut store = ItemStore::open(BrokenDisk);
            assert!(store.is_empty());
            assert!(store.is_persisted());

            store.insert(item("A"));
            store.insert(item("B"));
            assert_eq!(names(&store), ["A", "B"]);
            assert!(!store.is_persisted());
        }

        #[test]
        fn store_accepts_empty_names() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("todos.json");
            let mut store = reopen(&path);
            store.insert(item("A"));
            store.insert(item(""));
            store.replace(0, item("")).expect("replace");

            let reloaded = reopen(&path);
            assert_eq!(names(&reloaded), ["", ""]);
            assert!(reloaded.is_persisted());
        }

        fn arb_item() -> impl Strategy<Value = ToDoItem> {
            (
                any::<String>(),
                -62_135_596_800i64..=253_402_300_799i64,
                0u32..1_000_000_000,
                any::<String>(),
                any::<bool>(),
                any::<bool>(),
            )
                .prop_map(|(name, secs, nanos, notes, reminder_set, completed)| ToDoItem {
                    name,
                    date: Utc.timestamp_opt(secs, nanos).unwrap(),
                    notes,
                    reminder_set,
                    completed,
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn saved_lists_reload_unchanged(items in prop::collection::vec(arb_item(), 0..12)) {
                let tmp = tempfile::tempdir().expect("tempdir");
                let path = tmp.path().join("todos.json");
                let repo = JsonFileRepository::new(&path);
                let list = ToDoList::from(items.clone());
                prop_assert!(save_items(&repo, &list));
                prop_assert_eq!(load_items(&repo), list);
                let reopened = reopen(&path);
                prop_assert_eq!(reopened.items(), &items[..]);
            }

            #[test]
            fn inserted_items_survive_reopen_at_the_end(
                items in prop::collection::vec(arb_item(), 0..6),
                extra in arb_item(),
            ) {
                let tmp = tempfile::tempdir().expect("tempdir");
                let path = tmp.path().join("todos.json");
                let mut store = reopen(&path);
                for it in &items {
                    store.insert(it.clone());
                }
                prop_assert_eq!(store.insert(extra.clone()), items.len());
                let reloaded = reopen(&path);
                prop_assert_eq!(reloaded.len(), items.len() + 1);
                prop_assert_eq!(reloaded.get(items.len()), Some(&extra));
            }
        }
    }
}

pub mod format {
    //! Due-date presentation and input. Pure functions; no shared formatter.

    use chrono::{
        DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    };
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::{tag, take_while},
        character::complete::{char, digit1, one_of, space1},
        combinator::{all_consuming, map, map_res, opt},
        error::{VerboseError, VerboseErrorKind},
        sequence::{preceded, tuple},
    };
    use serde::Serialize;
    use std::fmt::Display;

    /// Short date, short time: `10/19/26, 3:04 PM`.
    const SHORT_FORMAT: &str = "%-m/%-d/%y, %-I:%M %p";

    /// Time of day assumed when only a date is given.
    const DEFAULT_DUE_TIME: (u32, u32) = (9, 0);

    pub fn format_due<Tz>(date: &DateTime<Utc>, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        date.with_timezone(tz).format(SHORT_FORMAT).to_string()
    }

    /// Due date as shown next to the reminder toggle.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct DueLabel {
        pub text: String,
        /// Drawn at full strength only while a reminder is set.
        pub emphasized: bool,
    }

    pub fn due_label<Tz>(date: &DateTime<Utc>, reminder_set: bool, tz: &Tz) -> DueLabel
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        DueLabel {
            text: format_due(date, tz),
            emphasized: reminder_set,
        }
    }

    /* ------------------------------ Input ------------------------------ */

    #[derive(Debug, thiserror::Error, PartialEq, Eq)]
    pub enum DueParseError {
        #[error(
            "unrecognised due date {0:?}; expected YYYY-MM-DD [HH:MM], RFC 3339, or +N followed by m, h, d or w"
        )]
        Syntax(String),
        #[error("{0} does not exist in the local time zone")]
        NonexistentLocalTime(NaiveDateTime),
        #[error("due date {0:?} is out of range")]
        OutOfRange(String),
    }

    /// Parse a due date typed by the user.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` (wall time in `now`'s
    /// zone) and offsets such as `+30m`, `+2h`, `+1d`, `+2w` counted from `now`.
    pub fn parse_due<Tz: TimeZone>(
        input: &str,
        now: &DateTime<Tz>,
    ) -> Result<DateTime<Utc>, DueParseError> {
        let input = input.trim();
        if let Ok(exact) = DateTime::parse_from_rfc3339(input) {
            return Ok(exact.with_timezone(&Utc));
        }

        let (_, expr) =
            all_consuming(due_expr)(input).map_err(|_| DueParseError::Syntax(input.to_string()))?;

        match expr {
            DueExpr::Offset { amount, unit } => {
                let delta = match unit {
                    'm' => Duration::try_minutes(amount),
                    'h' => Duration::try_hours(amount),
                    'd' => Duration::try_days(amount),
                    _ => Duration::try_weeks(amount),
                }
                .ok_or_else(|| DueParseError::OutOfRange(input.to_string()))?;
                now.with_timezone(&Utc)
                    .checked_add_signed(delta)
                    .ok_or_else(|| DueParseError::OutOfRange(input.to_string()))
            }
            DueExpr::Wall { date, time } => {
                let time = match time {
                    Some(t) => t,
                    None => NaiveTime::from_hms_opt(DEFAULT_DUE_TIME.0, DEFAULT_DUE_TIME.1, 0)
                        .ok_or_else(|| DueParseError::OutOfRange(input.to_string()))?,
                };
                let naive = date.and_time(time);
                now.timezone()
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or(DueParseError::NonexistentLocalTime(naive))
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum DueExpr {
        Offset { amount: i64, unit: char },
        Wall { date: NaiveDate, time: Option<NaiveTime> },
    }

    type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

    fn due_expr(i: &str) -> PResult<'_, DueExpr> {
        alt((
            map(parse_offset, |(amount, unit)| DueExpr::Offset { amount, unit }),
            map(
                tuple((
                    parse_date,
                    opt(preceded(alt((space1, tag("T"))), parse_time)),
                )),
                |(date, time)| DueExpr::Wall { date, time },
            ),
        ))(i)
    }

    fn parse_offset(i: &str) -> PResult<'_, (i64, char)> {
        // +90m, +2h, +1d, +3w
        let (i, _) = char('+')(i)?;
        let (i, amount) = map_res(digit1, |s: &str| s.parse::<i64>())(i)?;
        let (i, unit) = one_of("mhdw")(i)?;
        Ok((i, (amount, unit)))
    }

    fn parse_date(i: &str) -> PResult<'_, NaiveDate> {
        map_res(
            tuple((
                map_res(take_while_m_n(4, 4, char_is_digit), |s: &str| {
                    s.parse::<i32>()
                }),
                char('-'),
                map_res(take_while_m_n(2, 2, char_is_digit), |s: &str| {
                    s.parse::<u32>()
                }),
                char('-'),
                map_res(take_while_m_n(2, 2, char_is_digit), |s: &str| {
                    s.parse::<u32>()
                }),
            )),
            |(y, _, m, _, d)| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date"),
        )(i)
    }

    fn parse_time(i: &str) -> PResult<'_, NaiveTime> {
        map_res(
            tuple((
                map_res(take_while_m_n(1, 2, char_is_digit), |s: &str| {
                    s.parse::<u32>()
                }),
                char(':'),
                map_res(take_while_m_n(2, 2, char_is_digit), |s: &str| {
                    s.parse::<u32>()
                }),
            )),
            |(h, _, m)| NaiveTime::from_hms_opt(h, m, 0).ok_or("invalid time"),
        )(i)
    }

    fn take_while_m_n<F>(m: usize, n: usize, cond: F) -> impl Fn(&str) -> PResult<'_, &str>
    where
        F: Fn(char) -> bool + Copy,
    {
        move |i: &str| {
            let (i, out) = take_while(cond)(i)?;
            if out.len() < m || out.len() > n {
                Err(nom::Err::Error(VerboseError {
                    errors: vec![(i, VerboseErrorKind::Context("m_n"))],
                }))
            } else {
                Ok((i, out))
            }
        }
    }

    fn char_is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

}

pub mod reminders {
    //! Boundary to the platform's notification permission.
    //!
    //! The answer arrives once, possibly later than the question. Dropping a
    //! ticket before the answer arrives turns the reply into a no-op.

    use tokio::sync::oneshot::{self, error::TryRecvError};
    use tracing::debug;

    /// Something that can tell whether reminder notifications are allowed.
    pub trait ReminderAuthorizer {
        fn request_status(&self) -> AuthorizationTicket;
    }

    /// Pending answer to an authorization request.
    #[derive(Debug)]
    pub struct AuthorizationTicket {
        rx: oneshot::Receiver<bool>,
    }

    /// Responder half handed to whatever produces the answer.
    #[derive(Debug)]
    pub struct AuthorizationReply {
        tx: oneshot::Sender<bool>,
    }

    impl AuthorizationTicket {
        pub fn channel() -> (AuthorizationReply, AuthorizationTicket) {
            let (tx, rx) = oneshot::channel();
            (AuthorizationReply { tx }, AuthorizationTicket { rx })
        }

        /// Ticket whose answer is already known.
        pub fn ready(authorized: bool) -> Self {
            let (reply, ticket) = Self::channel();
            reply.send(authorized);
            ticket
        }

        /// Non-blocking check; `None` while the answer is still out. A responder
        /// that went away without answering counts as "not authorized". The
        /// answer is handed out once.
        pub fn try_resolve(&mut self) -> Option<bool> {
            match self.rx.try_recv() {
                Ok(authorized) => Some(authorized),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(false),
            }
        }

        /// Block until the answer arrives. Must not be called from inside an
        /// async runtime.
        pub fn wait(self) -> bool {
            self.rx.blocking_recv().unwrap_or(false)
        }
    }

    impl AuthorizationReply {
        pub fn send(self, authorized: bool) {
            if self.tx.send(authorized).is_err() {
                debug!("authorization answer arrived after its requester went away");
            }
        }
    }

    /// Fixed answer; what a front end without a permission system uses.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StaticAuthorizer {
        authorized: bool,
    }

    impl StaticAuthorizer {
        pub fn allowed() -> Self {
            Self { authorized: true }
        }

        pub fn denied() -> Self {
            Self { authorized: false }
        }
    }

    impl ReminderAuthorizer for StaticAuthorizer {
        fn request_status(&self) -> AuthorizationTicket {
            AuthorizationTicket::ready(self.authorized)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::thread;

        #[test]
        fn static_answers_are_ready_immediately() {
            assert_eq!(StaticAuthorizer::allowed().request_status().try_resolve(), Some(true));
            assert_eq!(StaticAuthorizer::denied().request_status().try_resolve(), Some(false));
        }

        #[test]
        fn pending_until_reply_arrives() {
            let (reply, mut ticket) = AuthorizationTicket::channel();
            assert_eq!(ticket.try_resolve(), None);
            assert_eq!(ticket.try_resolve(), None);
            reply.send(true);
            assert_eq!(ticket.try_resolve(), Some(true));
        }

        #[test]
        fn dropped_reply_means_denied() {
            let (reply, mut ticket) = AuthorizationTicket::channel();
            drop(reply);
            assert_eq!(ticket.try_resolve(), Some(false));
        }

        #[test]
        fn dropped_reply_unblocks_wait_as_denied() {
            let (reply, ticket) = AuthorizationTicket::channel();
            drop(reply);
            assert!(!ticket.wait());
        }

        #[test]
        fn late_reply_after_ticket_dropped_is_harmless() {
            let (reply, ticket) = AuthorizationTicket::channel();
            drop(ticket);
            reply.send(true);
        }

        #[test]
        fn wait_receives_answer_from_another_thread() {
            let (reply, ticket) = AuthorizationTicket::channel();
            let handle = thread::spawn(move || reply.send(true));
            assert!(ticket.wait());
            handle.join().expect("join");
        }
    }
}

pub mod editor {
    //! Detail editor: builds a new item or an edited copy of an existing one.

    use super::core::{DomainError, ToDoItem};
    use super::format::{DueLabel, due_label};
    use super::reminders::{AuthorizationTicket, ReminderAuthorizer};
    use chrono::{DateTime, TimeZone, Utc};
    use std::{fmt::Display, rc::Rc};

    /// Which row the editor will write back to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EditTarget {
        New,
        /// Position of the row when editing began.
        Existing(usize),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum EditorOutcome {
        Confirmed { target: EditTarget, item: ToDoItem },
        Cancelled,
    }

    /// Process lifecycle signals the editor reacts to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LifecycleEvent {
        BecameActive,
    }

    /// Message for the user when a reminder had to be switched off.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ReminderNotice {
        NotificationsDisabled,
    }

    impl ReminderNotice {
        pub fn title(&self) -> &'static str {
            match self {
                ReminderNotice::NotificationsDisabled => "User Has Not Allowed Notifications",
            }
        }

        pub fn message(&self) -> &'static str {
            match self {
                ReminderNotice::NotificationsDisabled => {
                    "To receive alerts for reminders, allow notifications for To Do List in the system settings."
                }
            }
        }
    }

    pub struct DetailEditor {
        target: EditTarget,
        draft: ToDoItem,
        authorizer: Rc<dyn ReminderAuthorizer>,
        pending: Option<AuthorizationTicket>,
    }

    impl DetailEditor {
        /// Add mode: blank name, due a day after `now`.
        pub fn for_new(now: DateTime<Utc>, authorizer: Rc<dyn ReminderAuthorizer>) -> Self {
            Self::open(EditTarget::New, ToDoItem::draft(now), authorizer)
        }

        /// Edit mode for the item currently at `index`.
        pub fn for_existing(
            index: usize,
            item: &ToDoItem,
            authorizer: Rc<dyn ReminderAuthorizer>,
        ) -> Self {
            Self::open(EditTarget::Existing(index), item.clone(), authorizer)
        }

        fn open(target: EditTarget, draft: ToDoItem, authorizer: Rc<dyn ReminderAuthorizer>) -> Self {
            let mut editor = Self {
                target,
                draft,
                authorizer,
                pending: None,
            };
            editor.check_authorization();
            editor
        }

        pub fn target(&self) -> EditTarget {
            self.target
        }

        pub fn name(&self) -> &str {
            &self.draft.name
        }

        pub fn date(&self) -> DateTime<Utc> {
            self.draft.date
        }

        pub fn notes(&self) -> &str {
            &self.draft.notes
        }

        pub fn reminder_set(&self) -> bool {
            self.draft.reminder_set
        }

        pub fn set_name(&mut self, name: impl Into<String>) {
            self.draft.name = name.into();
        }

        pub fn set_date(&mut self, date: DateTime<Utc>) {
            self.draft.date = date;
        }

        pub fn set_notes(&mut self, notes: impl Into<String>) {
            self.draft.notes = notes.into();
        }

        /// Flipping the toggle re-asks for permission; see [`Self::poll_authorization`].
        pub fn set_reminder(&mut self, on: bool) {
            self.draft.reminder_set = on;
            self.check_authorization();
        }

        pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
            match event {
                LifecycleEvent::BecameActive => self.check_authorization(),
            }
        }

        /// Dispatch a fresh permission check, replacing any unanswered one.
        pub fn check_authorization(&mut self) {
            self.pending = Some(self.authorizer.request_status());
        }

        pub fn awaiting_authorization(&self) -> bool {
            self.pending.is_some()
        }

        /// Apply the permission answer if it has arrived.
        pub fn poll_authorization(&mut self) -> Option<ReminderNotice> {
            let authorized = self.pending.as_mut()?.try_resolve()?;
            self.pending = None;
            self.apply_authorization(authorized)
        }

        /// A reminder cannot stay on without permission to deliver it.
        pub fn apply_authorization(&mut self, authorized: bool) -> Option<ReminderNotice> {
            if !authorized && self.draft.reminder_set {
                self.draft.reminder_set = false;
                Some(ReminderNotice::NotificationsDisabled)
            } else {
                None
            }
        }

        pub fn due_label<Tz>(&self, tz: &Tz) -> DueLabel
        where
            Tz: TimeZone,
            Tz::Offset: Display,
        {
            due_label(&self.draft.date, self.draft.reminder_set, tz)
        }

        pub fn can_confirm(&self) -> bool {
            !self.draft.name.is_empty()
        }

        /// Finished item for the caller to store. `completed` is carried over
        /// from the item the editor was opened with.
        ///
        /// Consumes the editor, so one session yields at most one row; check
        /// [`Self::can_confirm`] first to keep editing after a refusal.
        pub fn confirm(self) -> Result<EditorOutcome, DomainError> {
            if !self.can_confirm() {
                return Err(DomainError::EmptyName);
            }
            Ok(EditorOutcome::Confirmed {
                target: self.target,
                item: self.draft,
            })
        }

        pub fn cancel(self) -> EditorOutcome {
            EditorOutcome::Cancelled
        }
    }

}

pub mod controller {
    //! List controller: user actions in, store mutations and change events out.

    use super::core::{DomainError, ToDoItem};
    use super::editor::{DetailEditor, EditTarget, EditorOutcome};
    use super::format::format_due;
    use super::reminders::ReminderAuthorizer;
    use super::storage::ItemRepository;
    use super::store::ItemStore;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Serialize;
    use std::{
        fmt::Display,
        rc::Rc,
        sync::mpsc::{self, Receiver, Sender},
    };
    use tracing::debug;

    /// Change notification published after a successful mutation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(tag = "event", rename_all = "snake_case")]
    pub enum ListEvent {
        Inserted { index: usize },
        Updated { index: usize },
        Removed { index: usize },
        Moved { from: usize, to: usize },
    }

    /// One display row. Field names follow the data file's camelCase.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListRow {
        pub index: usize,
        pub name: String,
        pub due: String,
        pub reminder_set: bool,
        pub completed: bool,
    }

    pub struct ListController<R: ItemRepository> {
        store: ItemStore<R>,
        authorizer: Rc<dyn ReminderAuthorizer>,
        editing: bool,
        subscribers: Vec<Sender<ListEvent>>,
    }

    impl<R: ItemRepository> ListController<R> {
        pub fn new(store: ItemStore<R>, authorizer: Rc<dyn ReminderAuthorizer>) -> Self {
            Self {
                store,
                authorizer,
                editing: false,
                subscribers: Vec::new(),
            }
        }

        pub fn store(&self) -> &ItemStore<R> {
            &self.store
        }

        pub fn item(&self, index: usize) -> Result<&ToDoItem, DomainError> {
            self.store.get(index).ok_or(DomainError::IndexOutOfRange {
                index,
                len: self.store.len(),
            })
        }

        pub fn rows<Tz>(&self, tz: &Tz) -> Vec<ListRow>
        where
            Tz: TimeZone,
            Tz::Offset: Display,
        {
            self.store
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| ListRow {
                    index,
                    name: item.name.clone(),
                    due: format_due(&item.date, tz),
                    reminder_set: item.reminder_set,
                    completed: item.completed,
                })
                .collect()
        }

        /* --------------------------- Edit mode --------------------------- */

        pub fn is_editing(&self) -> bool {
            self.editing
        }

        /// Enter or leave reorder/delete mode; returns the new state.
        pub fn toggle_editing(&mut self) -> bool {
            self.editing = !self.editing;
            self.editing
        }

        pub fn can_add(&self) -> bool {
            !self.editing
        }

        /* ---------------------------- Editor ---------------------------- */

        pub fn begin_add(&self, now: DateTime<Utc>) -> Result<DetailEditor, DomainError> {
            if !self.can_add() {
                return Err(DomainError::AddWhileEditing);
            }
            Ok(DetailEditor::for_new(now, self.authorizer.clone()))
        }

        pub fn begin_edit(&self, index: usize) -> Result<DetailEditor, DomainError> {
            let item = self.item(index)?;
            Ok(DetailEditor::for_existing(
                index,
                item,
                self.authorizer.clone(),
            ))
        }

        /// Apply what the editor produced. Returns the row written, or `None`
        /// when the editor was cancelled.
        pub fn finish(&mut self, outcome: EditorOutcome) -> Result<Option<usize>, DomainError> {
            match outcome {
                EditorOutcome::Cancelled => Ok(None),
                EditorOutcome::Confirmed {
                    target: EditTarget::New,
                    item,
                } => {
                    let index = self.store.insert(item);
                    self.publish(ListEvent::Inserted { index });
                    Ok(Some(index))
                }
                EditorOutcome::Confirmed {
                    target: EditTarget::Existing(index),
                    item,
                } => {
                    self.store.replace(index, item)?;
                    self.publish(ListEvent::Updated { index });
                    Ok(Some(index))
                }
            }
        }

        /* --------------------------- Mutations --------------------------- */

        pub fn delete(&mut self, index: usize) -> Result<ToDoItem, DomainError> {
            let removed = self.store.delete(index)?;
            self.publish(ListEvent::Removed { index });
            Ok(removed)
        }

        pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
            self.store.move_item(from, to)?;
            self.publish(ListEvent::Moved { from, to });
            Ok(())
        }

        /* ---------------------------- Events ---------------------------- */

        pub fn subscribe(&mut self) -> Receiver<ListEvent> {
            let (tx, rx) = mpsc::channel();
            self.subscribers.push(tx);
            rx
        }

        fn publish(&mut self, event: ListEvent) {
            debug!(?event, "list changed");
            self.subscribers.retain(|tx| tx.send(event).is_ok());
        }
    }

}

pub use controller::{ListController, ListEvent, ListRow};
pub use crate::core::{DomainError, ToDoItem, ToDoList};
pub use editor::{DetailEditor, EditTarget, EditorOutcome, LifecycleEvent, ReminderNotice};
pub use format::{DueLabel, DueParseError, format_due, parse_due};
pub use reminders::{AuthorizationTicket, ReminderAuthorizer, StaticAuthorizer};
pub use storage::{ItemRepository, JsonFileRepository, PersistError, resolve_data_file};
pub use store::ItemStore;
