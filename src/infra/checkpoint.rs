// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores encoder + classifier weights using Burn's
// NamedMpkFileRecorder at full precision, so a reloaded epoch
// scores exactly as it did when it was saved.
//
// File naming convention:
//   checkpoints/
//     encoder_epoch_1.mpk       ← encoder weights after epoch 1
//     classifier_epoch_1.mpk    ← classifier weights after epoch 1
//     ...
//     latest_epoch.json         ← number of the last saved epoch
//     best_epoch.json           ← epoch with the lowest val_loss
//     train_config.json         ← hyperparameters, to rebuild
//                                 the same architecture later
//
// Loading needs the architecture first: evaluation and
// inference read train_config.json, build fresh components
// with the same sizes, then load the records into them.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const BEST_EPOCH_FILE:   &str = "best_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";

/// Manages saving and loading of checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create checkpoint directory '{}': {}", dir.display(), e);
        }
        Self { dir }
    }

    /// Save both components' weights for `epoch` and advance the
    /// latest-epoch pointer.
    pub fn save_components<B, E, C>(&self, encoder: &E, classifier: &C, epoch: usize) -> Result<()>
    where
        B: Backend,
        E: Module<B>,
        C: Module<B>,
    {
        self.save_record::<B, _>(encoder.clone(), self.encoder_path(epoch))?;
        self.save_record::<B, _>(classifier.clone(), self.classifier_path(epoch))?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load weights for `epoch` into freshly built components.
    ///
    /// The components must have the architecture the checkpoint was
    /// saved with or the recorder rejects the file.
    pub fn load_components<B, E, C>(
        &self,
        encoder:    E,
        classifier: C,
        epoch:      usize,
        device:     &B::Device,
    ) -> Result<(E, C)>
    where
        B: Backend,
        E: Module<B>,
        C: Module<B>,
    {
        tracing::info!("Loading checkpoint from epoch {}", epoch);
        let encoder    = self.load_record::<B, _>(encoder, self.encoder_path(epoch), device)?;
        let classifier = self.load_record::<B, _>(classifier, self.classifier_path(epoch), device)?;
        Ok((encoder, classifier))
    }

    /// Best epoch if validation ever ran, otherwise the latest one.
    pub fn preferred_epoch(&self) -> Result<usize> {
        match self.best_epoch()? {
            Some(epoch) => Ok(epoch),
            None        => self.latest_epoch(),
        }
    }

    pub fn save_best_epoch(&self, epoch: usize) -> Result<()> {
        self.write_json(BEST_EPOCH_FILE, &epoch)
    }

    /// Forget the best epoch of an earlier run in the same directory.
    pub fn clear_best_epoch(&self) -> Result<()> {
        let path = self.dir.join(BEST_EPOCH_FILE);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot remove '{}'", path.display()))?;
            tracing::debug!("Removed stale '{}'", path.display());
        }
        Ok(())
    }

    /// Read best_epoch.json. `None` if no epoch was ever marked best.
    pub fn best_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join(BEST_EPOCH_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_json(BEST_EPOCH_FILE)?))
    }

    /// Read latest_epoch.json and return the epoch number.
    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
            .context("Cannot find a saved epoch. Have you run 'train' first?")
    }

    /// Save the training configuration to JSON.
    ///
    /// Called before training starts so later commands can rebuild
    /// the exact architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.join(CONFIG_FILE).display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE).context(
            "Cannot read the training config. \
             Make sure you have run 'train' before 'evaluate' or 'predict'.",
        )
    }

    // ─── Helpers ──────────────────────────────────────────────────────────────

    fn encoder_path(&self, epoch: usize) -> PathBuf {
        // no extension: the recorder adds it
        self.dir.join(format!("encoder_epoch_{epoch}"))
    }

    fn classifier_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("classifier_epoch_{epoch}"))
    }

    fn save_record<B: Backend, M: Module<B>>(&self, module: M, path: PathBuf) -> Result<()> {
        NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .record(module.into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
    }

    fn load_record<B: Backend, M: Module<B>>(
        &self,
        module: M,
        path:   PathBuf,
        device: &B::Device,
    ) -> Result<M> {
        let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(module.load_record(record))
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
