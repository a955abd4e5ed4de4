//! Per-document overlay session
//!
//! Owns one document together with its highlights and notes, sequences user
//! actions against them and moves everything to and from storage.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::anchor::Anchor;
use crate::annotation::{
    Annotation, AnnotationKey, Gesture, Layout, NotePlacement, Point, ResizeGesture,
};
use crate::config::OverlayConfig;
use crate::db::{AnnotationRecord, HighlightRecord, OverlayRepository};
use crate::dom::{Document, Position, Range};
use crate::error::Result;
use crate::highlight::{HighlightId, HighlightSet};

/// Answer to a delete confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Confirmation {
    pub proceed: bool,
    /// Stop asking for the rest of the session
    pub dont_ask_again: bool,
}

/// Outcome of loading stored overlays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub annotations_loaded: usize,
    pub annotations_skipped: usize,
    pub highlights_loaded: usize,
    pub highlights_skipped: usize,
}

/// Serializable view of a session's overlays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub item_id: i64,
    pub highlights: Vec<HighlightSummary>,
    pub annotations: Vec<AnnotationSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightSummary {
    pub start: Anchor,
    pub end: Anchor,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSummary {
    pub id: Option<i64>,
    pub anchor: Option<Anchor>,
    pub cols: u32,
    pub rows: u32,
    pub text: String,
}

/// All overlays for one open item
pub struct AnnotationSession {
    item_id: i64,
    document: Document,
    config: OverlayConfig,
    highlights: HighlightSet,
    annotations: Vec<Annotation>,
    /// Stored note ids removed since the last save
    deleted: Vec<i64>,
    gesture: Option<Gesture>,
    next_key: u64,
    z_index: u32,
}

impl AnnotationSession {
    /// Start a session over `document`, dropping any overlay markup it
    /// already carries
    pub fn new(item_id: i64, mut document: Document, config: OverlayConfig) -> Self {
        let stale = document.strip_overlays();
        if stale > 0 {
            debug!(item_id, stale, "removed stale overlay markup");
        }
        let highlights = HighlightSet::new(config.highlight_color.clone());
        Self {
            item_id,
            document,
            config,
            highlights,
            annotations: Vec::new(),
            deleted: Vec::new(),
            gesture: None,
            next_key: 1,
            z_index: 100,
        }
    }

    pub fn item_id(&self) -> i64 {
        self.item_id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, key: AnnotationKey) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.key == key)
    }

    fn annotation_mut(&mut self, key: AnnotationKey) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.key == key)
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    fn allocate_key(&mut self) -> AnnotationKey {
        let key = AnnotationKey(self.next_key);
        self.next_key += 1;
        key
    }

    // ------------------------------------------------------------------
    // Highlights
    // ------------------------------------------------------------------

    pub fn highlight(&mut self, range: Range) -> Result<Option<HighlightId>> {
        self.cancel_gesture();
        Ok(self.highlights.create(&mut self.document, range)?)
    }

    pub fn unhighlight(&mut self, range: Range) -> Result<()> {
        self.cancel_gesture();
        Ok(self.highlights.unhighlight(&mut self.document, range)?)
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Pin a new note at `position`, drawn at the clicked page point
    pub fn create_annotation(
        &mut self,
        position: Position,
        click: Point,
        layout: &dyn Layout,
    ) -> Result<AnnotationKey> {
        self.cancel_gesture();

        let key = self.allocate_key();
        let mut note = Annotation::new(
            key,
            self.config.default_cols,
            self.config.default_rows,
            self.z_index,
        );
        pin_note(&mut self.document, &mut note, position, click, layout)?;

        debug!(%key, "added new annotation");
        self.annotations.push(note);
        Ok(key)
    }

    pub fn set_text(&mut self, key: AnnotationKey, text: &str) -> bool {
        match self.annotation_mut(key) {
            Some(note) => {
                note.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Delete a note, asking first when it has text and warnings are on.
    ///
    /// Returns whether the note was deleted.
    pub fn delete_annotation<F>(&mut self, key: AnnotationKey, confirm: F) -> bool
    where
        F: FnOnce(&Annotation) -> Confirmation,
    {
        let Some(index) = self.annotations.iter().position(|a| a.key == key) else {
            return false;
        };

        let note = &self.annotations[index];
        if !note.text.is_empty() && self.config.warn_on_close {
            let answer = confirm(note);
            if answer.dont_ask_again {
                self.config.warn_on_close = false;
            }
            if !answer.proceed {
                debug!(%key, "delete cancelled");
                return false;
            }
        }

        let mut note = self.annotations.remove(index);
        note.marker.clear(&mut self.document);
        if let Some(id) = note.id {
            self.deleted.push(id);
        }
        if self.gesture.as_ref().map(Gesture::annotation) == Some(key) {
            self.gesture = None;
        }

        debug!(%key, "deleted annotation");
        true
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        for note in &mut self.annotations {
            note.collapsed = collapsed;
        }
    }

    /// Raise a note above all others (a click on the note)
    pub fn bring_to_front(&mut self, key: AnnotationKey) -> bool {
        self.cancel_gesture();
        self.z_index += 1;
        let z_index = self.z_index;
        match self.annotation_mut(key) {
            Some(note) => {
                note.z_index = z_index;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Grab a note's resize handle at `pointer`
    pub fn begin_resize(
        &mut self,
        key: AnnotationKey,
        pointer: Point,
        layout: &dyn Layout,
    ) -> bool {
        self.cancel_gesture();
        let Some(note) = self.annotation(key) else {
            return false;
        };
        self.gesture = Some(Gesture::Resize(ResizeGesture {
            annotation: key,
            origin: pointer,
            start_cols: note.cols,
            start_rows: note.rows,
            cell: layout.cell_size(),
        }));
        true
    }

    /// Arm a move: the next click re-pins the note
    pub fn begin_move(&mut self, key: AnnotationKey) -> bool {
        self.cancel_gesture();
        if self.annotation(key).is_none() {
            return false;
        }
        self.gesture = Some(Gesture::Move { annotation: key });
        true
    }

    /// Pointer moved during a resize; returns the new size
    pub fn drag_to(&mut self, pointer: Point) -> Option<(u32, u32)> {
        let Some(Gesture::Resize(resize)) = &self.gesture else {
            return None;
        };
        let (cols, rows) = resize.size_at(pointer, self.config.min_cols, self.config.min_rows);
        let key = resize.annotation;
        let note = self.annotation_mut(key)?;
        note.cols = cols;
        note.rows = rows;
        Some((cols, rows))
    }

    /// A click in the document; completes a pending move.
    ///
    /// Returns the moved note, or `None` when no move was armed.
    pub fn click(
        &mut self,
        position: Position,
        pointer: Point,
        layout: &dyn Layout,
    ) -> Result<Option<AnnotationKey>> {
        let Some(Gesture::Move { annotation: key }) = self.gesture else {
            return Ok(None);
        };
        self.gesture = None;

        let Some(index) = self.annotations.iter().position(|a| a.key == key) else {
            return Ok(None);
        };
        let note = &mut self.annotations[index];
        pin_note(&mut self.document, note, position, pointer, layout)?;

        debug!(%key, "moved annotation");
        Ok(Some(key))
    }

    /// Pointer released; ends a resize
    pub fn end_gesture(&mut self) -> bool {
        if matches!(self.gesture, Some(Gesture::Resize(_))) {
            self.gesture = None;
            return true;
        }
        false
    }

    /// Drop any in-flight gesture (focus lost or another action started)
    pub fn cancel_gesture(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            debug!(annotation = %gesture.annotation(), "gesture cancelled");
        }
    }

    /// Current on-page placement of every note
    pub fn refresh(&self, layout: &dyn Layout) -> Vec<NotePlacement> {
        self.annotations
            .iter()
            .filter_map(|note| {
                note.placement(&self.document, layout, &self.config.annotation_color)
            })
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            item_id: self.item_id,
            highlights: self
                .highlights
                .iter()
                .map(|h| HighlightSummary {
                    start: h.start().clone(),
                    end: h.end().clone(),
                    text: h.text(&self.document),
                })
                .collect(),
            annotations: self
                .annotations
                .iter()
                .map(|note| AnnotationSummary {
                    id: note.id,
                    anchor: note.anchor(&self.document),
                    cols: note.cols,
                    rows: note.rows,
                    text: note.text.clone(),
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    /// Load stored overlays: notes first, then highlights.
    ///
    /// Rows that are malformed or no longer match the document are logged
    /// and skipped.
    pub async fn load(&mut self, repo: &OverlayRepository<'_>) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for row in repo.list_annotations(self.item_id).await? {
            let parsed = row.anchor().and_then(|anchor| Ok((anchor, row.size()?)));
            let (anchor, (cols, rows)) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(id = row.id, error = %e, "skipping annotation row");
                    report.annotations_skipped += 1;
                    continue;
                }
            };

            let key = self.allocate_key();
            let mut note = Annotation::new(key, cols, rows, self.z_index);
            if let Err(e) = note.marker.resolve(&mut self.document, &anchor) {
                warn!(id = row.id, error = %e, "could not load annotation");
                report.annotations_skipped += 1;
                continue;
            }
            note.id = Some(row.id);
            note.x = row.x;
            note.y = row.y;
            note.text = row.text;
            self.annotations.push(note);
            report.annotations_loaded += 1;
        }

        for row in repo.list_highlights(self.item_id).await? {
            let restored = row.anchors().and_then(|(start, end)| {
                Ok(self.highlights.restore(&mut self.document, &start, &end)?)
            });
            match restored {
                Ok(Some(_)) => report.highlights_loaded += 1,
                Ok(None) => {
                    warn!(id = row.id, "stored highlight is empty");
                    report.highlights_skipped += 1;
                }
                Err(e) => {
                    warn!(id = row.id, error = %e, "could not load highlight");
                    report.highlights_skipped += 1;
                }
            }
        }

        info!(item_id = self.item_id, ?report, "loaded overlays");
        Ok(report)
    }

    /// Write every overlay of the item in one transaction.
    ///
    /// New notes receive their storage ids only once the write committed.
    pub async fn save(&mut self, repo: &OverlayRepository<'_>) -> Result<()> {
        let highlights: Vec<HighlightRecord> = self
            .highlights
            .iter()
            .map(|h| HighlightRecord {
                start: h.start().clone(),
                end: h.end().clone(),
            })
            .collect();

        let mut saved = Vec::new();
        let mut records = Vec::new();
        for (index, note) in self.annotations.iter().enumerate() {
            let Some(anchor) = note.anchor(&self.document) else {
                warn!(key = %note.key, "annotation has no pin, not saved");
                continue;
            };
            saved.push(index);
            records.push(AnnotationRecord {
                id: note.id,
                anchor,
                x: note.x,
                y: note.y,
                cols: note.cols,
                rows: note.rows,
                text: note.text.clone(),
            });
        }

        let ids = repo
            .save_item(self.item_id, &highlights, &records, &self.deleted)
            .await?;

        for (index, id) in saved.into_iter().zip(ids) {
            self.annotations[index].id = Some(id);
        }
        self.deleted.clear();
        Ok(())
    }
}

/// Pin a note at `position` and keep its box at the clicked point
fn pin_note(
    doc: &mut Document,
    note: &mut Annotation,
    position: Position,
    click: Point,
    layout: &dyn Layout,
) -> Result<()> {
    note.marker.place(doc, position)?;
    if let Some(pin) = note.marker.pin() {
        let (pin_x, pin_y) = layout.pixel_offset(doc, pin);
        note.x = click.0 - pin_x;
        note.y = click.1 - pin_y;
    }
    Ok(())
}
