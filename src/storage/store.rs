use std::{io::ErrorKind, path::PathBuf};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::core::{tags::TagIndex, task::Task};

const TASKS_FILE: &str = "tasks.json";
const TAGS_FILE: &str = "tags.json";

/// File backed storage for the task collection and the tag index. The two are
/// independent records, each in its own file under the data directory.
/// Advisory file locks keep a concurrent invocation from reading a half-written
/// record.
pub struct TaskStore {
    data_dir: PathBuf,
}

impl TaskStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        self.load(TASKS_FILE).await
    }

    pub async fn load_tags(&self) -> Result<TagIndex> {
        self.load(TAGS_FILE).await
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.save(TASKS_FILE, tasks).await
    }

    pub async fn save_tags(&self, tags: &TagIndex) -> Result<()> {
        self.save(TAGS_FILE, tags).await
    }

    /// Reads one record file. A missing file or json damaged by an interrupted
    /// write degrades to the default value, loading never fails on bad data.
    async fn load<T: DeserializeOwned + Default>(&self, file_name: &str) -> Result<T> {
        let path = self.data_dir.join(file_name);
        debug!("Loading {path:?}");

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let mut contents = String::new();
        let read = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        read?;

        match serde_json::from_str::<T>(&contents) {
            Ok(value) => Ok(value),
            Err(e) => {
                // ignore illegal values. Might happen after shutdowns
                warn!("During parsing in path {path:?} found illegal json: {e}");
                Ok(T::default())
            }
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(file_name);

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::write_with_file(&mut file, value).await;
        file.unlock_async().await?;
        result
    }

    async fn write_with_file<T: Serialize + ?Sized>(file: &mut File, value: &T) -> Result<()> {
        let buffer = serde_json::to_vec(value)?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}
