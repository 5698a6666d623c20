//! Lazy, single-flight index materialization per language.
//!
//! Each language owns one engine handle and a readiness map. The first
//! `ensure_ready` call with no build in flight drives one `build_index` per
//! missing content type; every concurrent caller for that language attaches to
//! the same build through a `watch` channel and observes its single
//! completion. `Ready` never regresses. A failed type becomes `Failed`, the
//! error reaches every attached caller, and the next call retries it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{IndexEngine, IndexError};
use crate::search::{ContentType, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Unbuilt,
    Building,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
enum BuildStatus {
    Running,
    Done,
    Failed {
        content_type: ContentType,
        reason: String,
    },
}

struct SlotState {
    readiness: HashMap<ContentType, Readiness>,
    in_flight: Option<watch::Receiver<BuildStatus>>,
}

struct LanguageSlot<E> {
    engine: E,
    state: Mutex<SlotState>,
}

impl<E> LanguageSlot<E> {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Step {
    Ready,
    Attach(watch::Receiver<BuildStatus>),
    Drive(watch::Sender<BuildStatus>, Vec<ContentType>),
}

pub struct LanguageIndexRegistry<E> {
    // Indexed by `Language as usize`, in `Language::ALL` order.
    slots: Vec<LanguageSlot<E>>,
}

impl<E: IndexEngine> LanguageIndexRegistry<E> {
    /// Creates one engine per supported language. Content types the engine
    /// already holds start out `Ready`.
    pub fn new(mut engine_for: impl FnMut(Language) -> E) -> Self {
        let slots = Language::ALL
            .into_iter()
            .map(|language| {
                let engine = engine_for(language);
                let readiness = ContentType::SEARCHABLE
                    .into_iter()
                    .map(|ct| {
                        let r = if engine.has_index(ct) {
                            Readiness::Ready
                        } else {
                            Readiness::Unbuilt
                        };
                        (ct, r)
                    })
                    .collect();
                LanguageSlot {
                    engine,
                    state: Mutex::new(SlotState {
                        readiness,
                        in_flight: None,
                    }),
                }
            })
            .collect();
        Self { slots }
    }

    fn slot(&self, language: Language) -> &LanguageSlot<E> {
        &self.slots[language as usize]
    }

    pub fn engine(&self, language: Language) -> &E {
        &self.slot(language).engine
    }

    pub fn readiness(&self, language: Language, content_type: ContentType) -> Readiness {
        self.slot(language)
            .lock()
            .readiness
            .get(&content_type)
            .copied()
            .unwrap_or(Readiness::Unbuilt)
    }

    pub fn is_ready(&self, language: Language, content_type: ContentType) -> bool {
        self.readiness(language, content_type) == Readiness::Ready
    }

    /// True once every searchable content type of `language` is built.
    pub fn language_ready(&self, language: Language) -> bool {
        let state = self.slot(language).lock();
        ContentType::SEARCHABLE
            .iter()
            .all(|ct| state.readiness.get(ct) == Some(&Readiness::Ready))
    }

    /// True while a build for `language` is running.
    pub fn is_ingesting(&self, language: Language) -> bool {
        self.slot(language).lock().in_flight.is_some()
    }

    /// Resolves once every listed content type of `language` is `Ready`,
    /// building the missing ones at most once concurrently.
    pub async fn ensure_ready(
        &self,
        language: Language,
        content_types: &[ContentType],
    ) -> Result<(), IndexError> {
        if let Some(ct) = content_types.iter().find(|ct| !ct.is_searchable()) {
            return Err(IndexError::Unsupported(*ct));
        }
        let slot = self.slot(language);

        loop {
            match Self::next_step(slot, content_types) {
                Step::Ready => return Ok(()),
                Step::Drive(tx, pending) => {
                    return Self::drive(slot, language, tx, pending).await;
                }
                Step::Attach(rx) => {
                    debug!(%language, "waiting on in-flight index build");
                    match wait_for(rx).await {
                        Some(BuildStatus::Failed {
                            content_type,
                            reason,
                        }) if content_types.contains(&content_type) => {
                            return Err(IndexError::BuildFailed {
                                language,
                                content_type,
                                reason,
                            });
                        }
                        // Done, an unrelated failure, or an abandoned build:
                        // re-check our own types.
                        _ => continue,
                    }
                }
            }
        }
    }

    fn next_step(slot: &LanguageSlot<E>, content_types: &[ContentType]) -> Step {
        let mut state = slot.lock();
        let mut pending: Vec<ContentType> = content_types
            .iter()
            .copied()
            .filter(|ct| state.readiness.get(ct) != Some(&Readiness::Ready))
            .collect();
        pending.sort();
        pending.dedup();

        if pending.is_empty() {
            return Step::Ready;
        }
        if let Some(rx) = &state.in_flight {
            return Step::Attach(rx.clone());
        }

        let (tx, rx) = watch::channel(BuildStatus::Running);
        state.in_flight = Some(rx);
        for ct in &pending {
            state.readiness.insert(*ct, Readiness::Building);
        }
        Step::Drive(tx, pending)
    }

    async fn drive(
        slot: &LanguageSlot<E>,
        language: Language,
        tx: watch::Sender<BuildStatus>,
        pending: Vec<ContentType>,
    ) -> Result<(), IndexError> {
        let mut guard = InFlight {
            slot,
            pending: &pending,
            tx: Some(tx),
        };
        let started = Instant::now();
        info!(%language, content_types = pending.len(), "search ingest started");

        let outcomes = join_all(pending.iter().map(|&ct| async move {
            (ct, slot.engine.build_index(ct).await)
        }))
        .await;

        let mut failure = None;
        {
            let mut state = slot.lock();
            for (ct, outcome) in outcomes {
                match outcome {
                    Ok(()) => {
                        state.readiness.insert(ct, Readiness::Ready);
                    }
                    Err(e) => {
                        warn!(%language, content_type = %ct, error = %e, "index build failed");
                        state.readiness.insert(ct, Readiness::Failed);
                        failure.get_or_insert((ct, e.to_string()));
                    }
                }
            }
            state.in_flight = None;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match failure {
            None => {
                guard.finish(BuildStatus::Done);
                info!(%language, elapsed_ms, "search ingest finished");
                Ok(())
            }
            Some((content_type, reason)) => {
                guard.finish(BuildStatus::Failed {
                    content_type,
                    reason: reason.clone(),
                });
                warn!(%language, elapsed_ms, "search ingest finished with errors");
                Err(IndexError::BuildFailed {
                    language,
                    content_type,
                    reason,
                })
            }
        }
    }
}

/// Waits for the build behind `rx` to settle. `None` means the driving
/// caller went away before finishing.
async fn wait_for(mut rx: watch::Receiver<BuildStatus>) -> Option<BuildStatus> {
    loop {
        let status = rx.borrow_and_update().clone();
        if !matches!(status, BuildStatus::Running) {
            return Some(status);
        }
        if rx.changed().await.is_err() {
            return None;
        }
    }
}

/// Owned by the caller driving a build. If that caller is dropped before
/// the build settles, its types fall back to `Unbuilt` and attached waiters
/// are released so one of them can take over.
struct InFlight<'a, E> {
    slot: &'a LanguageSlot<E>,
    pending: &'a [ContentType],
    tx: Option<watch::Sender<BuildStatus>>,
}

impl<E> InFlight<'_, E> {
    fn finish(&mut self, status: BuildStatus) {
        if let Some(tx) = self.tx.take() {
            tx.send_replace(status);
        }
    }
}

impl<E> Drop for InFlight<'_, E> {
    fn drop(&mut self) {
        if self.tx.is_none() {
            return;
        }
        let mut state = self.slot.lock();
        for ct in self.pending {
            if state.readiness.get(ct) == Some(&Readiness::Building) {
                state.readiness.insert(*ct, Readiness::Unbuilt);
            }
        }
        state.in_flight = None;
        debug!("index build abandoned before completion");
    }
}
