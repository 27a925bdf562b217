use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::api::ExpenseApi;
use crate::editor::{RecordEditor, SubmitOutcome};
use crate::error::ErrorKind;
use crate::export::{self, ArtifactSink, ExportKind, ExportTable};
use crate::filter::{quick_filter, sort_rows, FilterSpec, Sort};
use crate::models::{Column, ExpenseRecord, PaymentCatalog, RecordId};
use crate::pager::{PageSize, Pager};
use crate::status::{FetchSequence, OpState};

pub const MSG_CREATED: &str = "Registro creado exitosamente";
pub const MSG_DELETED: &str = "Registro eliminado exitosamente";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error(ErrorKind),
}

/// A message for the user, queued until the front end drains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error(kind), message: message.into() }
    }
}

/// Everything the expense table shows: the fetched rows, the quick filter
/// over them, the page window, and the state of pending operations.
///
/// `rows` is a cache of the last accepted fetch. It is replaced wholesale,
/// never patched, and is re-fetched after every create or delete.
#[derive(Debug, Default)]
pub struct ExpenseView {
    rows: Vec<ExpenseRecord>,
    catalog: PaymentCatalog,
    quick_filter: String,
    sort: Option<Sort>,
    pager: Pager,
    sequence: FetchSequence,
    last_spec: Option<FilterSpec>,
    fetch_state: OpState,
    delete_state: OpState,
    notices: Vec<Notice>,
}

impl ExpenseView {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            pager: Pager::new(page_size),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[ExpenseRecord] {
        &self.rows
    }

    pub fn catalog(&self) -> &PaymentCatalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn quick_filter_text(&self) -> &str {
        &self.quick_filter
    }

    #[cfg(test)]
    pub fn fetch_state(&self) -> &OpState {
        &self.fetch_state
    }

    #[cfg(test)]
    pub fn delete_state(&self) -> &OpState {
        &self.delete_state
    }

    #[cfg(test)]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Rows passing the quick filter, in the active sort order. Recomputed
    /// from the full cache.
    pub fn filtered(&self) -> Vec<&ExpenseRecord> {
        let mut rows = quick_filter(&self.rows, &self.quick_filter, &self.catalog);
        if let Some(sort) = self.sort {
            sort_rows(&mut rows, sort, &self.catalog);
        }
        rows
    }

    /// Sum of the amounts of the filtered rows.
    pub fn total(&self) -> f64 {
        aggregate::total(self.filtered(), Column::Amount)
    }

    pub fn visible_page(&self) -> Vec<&ExpenseRecord> {
        self.pager.visible(&self.filtered()).to_vec()
    }

    pub fn range_label(&self) -> String {
        self.pager.range_label(self.filtered().len())
    }

    pub fn set_quick_filter(&mut self, text: impl Into<String>) {
        self.quick_filter = text.into();
        self.clamp_page();
    }

    /// `None` keeps the order the server returned.
    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) {
        let len = self.filtered().len();
        self.pager.set_page(page, len);
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        let len = self.filtered().len();
        self.pager.set_page_size(size, len);
    }

    fn clamp_page(&mut self) {
        let len = self.filtered().len();
        self.pager.clamp(len);
    }

    /// Ticket for a fetch about to be sent.
    pub fn begin_fetch(&mut self) -> u64 {
        let overlapping = self.fetch_state.is_busy();
        self.fetch_state = OpState::InFlight;
        let ticket = self.sequence.issue();
        debug!(ticket, overlapping, "fetch issued");
        ticket
    }

    /// Replace the rows with the response to fetch `ticket`, unless a newer
    /// fetch was applied first. Returns whether the rows were replaced.
    pub fn apply_fetch(&mut self, ticket: u64, rows: Vec<ExpenseRecord>) -> bool {
        if !self.sequence.accept(ticket) {
            debug!(ticket, latest = self.sequence.latest_applied(), "stale fetch discarded");
            return false;
        }
        debug!(ticket, rows = rows.len(), "fetch applied");
        self.rows = rows;
        self.fetch_state = OpState::Succeeded;
        self.clamp_page();
        true
    }

    /// Fetch the rows matching `spec` and make it the active filter.
    pub async fn refresh<A: ExpenseApi>(&mut self, api: &A, spec: &FilterSpec) -> bool {
        self.last_spec = Some(spec.clone());
        let ticket = self.begin_fetch();
        match api.filter(spec).await {
            Ok(rows) => {
                self.apply_fetch(ticket, rows);
                true
            }
            Err(e) => {
                warn!(error = %e, "fetch failed");
                self.fetch_state = OpState::Failed(e.to_string());
                self.notices
                    .push(Notice::error(e.kind(), format!("No se pudieron cargar los registros: {e}")));
                false
            }
        }
    }

    /// Re-run the last filter, if any was applied.
    pub async fn reload<A: ExpenseApi>(&mut self, api: &A) -> bool {
        match self.last_spec.clone() {
            Some(spec) => self.refresh(api, &spec).await,
            None => true,
        }
    }

    /// Load the payment-type catalog. Done once; later calls are no-ops.
    pub async fn load_catalog<A: ExpenseApi>(&mut self, api: &A) -> bool {
        if !self.catalog.is_empty() {
            return true;
        }
        match api.payment_types().await {
            Ok(types) => {
                debug!(count = types.len(), "payment types loaded");
                self.catalog = PaymentCatalog::new(types);
                self.clamp_page();
                true
            }
            Err(e) => {
                warn!(error = %e, "payment types unavailable");
                self.notices
                    .push(Notice::error(e.kind(), format!("No se pudieron cargar los tipos de pago: {e}")));
                false
            }
        }
    }

    /// Submit `editor` against the loaded catalog and reload on success.
    pub async fn submit<A: ExpenseApi>(&mut self, editor: &mut RecordEditor, api: &A) -> SubmitOutcome {
        let outcome = editor.submit(api, &self.catalog).await;
        match &outcome {
            SubmitOutcome::Saved(_) => {
                self.notices.push(Notice::success(MSG_CREATED));
                self.reload(api).await;
            }
            SubmitOutcome::Invalid(_) => {}
            SubmitOutcome::Failed(kind, reason) => {
                self.notices
                    .push(Notice::error(*kind, format!("No se pudo guardar el registro: {reason}")));
            }
            SubmitOutcome::Busy => {
                self.notices
                    .push(Notice::error(ErrorKind::Transport, "Ya hay un registro guardándose."));
            }
        }
        outcome
    }

    /// Delete one record and reload. Refused while another delete runs.
    pub async fn delete<A: ExpenseApi>(&mut self, api: &A, id: &RecordId) -> bool {
        if let Err(e) = self.delete_state.begin() {
            self.notices
                .push(Notice::error(e.kind(), "Ya hay una eliminación en curso."));
            return false;
        }
        let result = api.delete(id).await;
        self.delete_state.settle(&result);
        match result {
            Ok(()) => {
                info!(%id, "record deleted");
                self.notices.push(Notice::success(MSG_DELETED));
                self.reload(api).await;
                true
            }
            Err(e) => {
                warn!(%id, error = %e, "delete failed");
                self.notices
                    .push(Notice::error(e.kind(), format!("No se pudo eliminar el registro: {e}")));
                false
            }
        }
    }

    /// The table as it would be exported right now.
    pub fn export_table(&self) -> ExportTable {
        let filtered = self.filtered();
        let total = aggregate::total(filtered.iter().copied(), Column::Amount);
        let period = self.last_spec.as_ref().map(FilterSpec::describe).unwrap_or_default();
        ExportTable::build(filtered, &self.catalog, total).with_period(period)
    }

    /// Export the filtered rows and their total through `sink`.
    pub fn export(&mut self, kind: ExportKind, sink: &dyn ArtifactSink, now: DateTime<Utc>) -> bool {
        let table = self.export_table();
        match export::export(kind, &table, sink, now) {
            Ok(path) => {
                self.notices
                    .push(Notice::success(format!("Archivo guardado en {}", path.display())));
                true
            }
            Err(e) => {
                warn!(?kind, error = %e, "export failed");
                let what = match kind {
                    ExportKind::Pdf => "el PDF",
                    ExportKind::Xlsx => "el archivo Excel",
                };
                self.notices
                    .push(Notice::error(e.kind(), format!("No se pudo generar {what}: {e}")));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tests::FakeApi;
    use crate::editor::{Draft, ExpenseDraft};
    use crate::filter::SortOrder;
    use crate::models::Amount;

    fn rec(id: i64, amount: f64, desc: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: Some(RecordId::Int(id)),
            amount: Some(Amount::Number(amount)),
            payment_type: "EF".into(),
            date: "2025-01-10".into(),
            description: desc.into(),
        }
    }

    fn spec() -> FilterSpec {
        FilterSpec::Monthly { year: 2025, month: 1, payment_type: None }
    }

    fn seeded(n: i64) -> FakeApi {
        let api = FakeApi::default();
        *api.rows.borrow_mut() = (1..=n).map(|i| rec(i, 10.0, &format!("Gasto {i}"))).collect();
        api
    }

    #[tokio::test]
    async fn test_refresh_replaces_rows() {
        let api = seeded(12);
        let mut view = ExpenseView::new(PageSize::Five);
        assert!(view.refresh(&api, &spec()).await);
        assert_eq!(view.rows().len(), 12);
        assert_eq!(view.visible_page().len(), 5);
        assert_eq!(view.total(), 120.0);
        assert_eq!(view.fetch_state(), &OpState::Succeeded);
        assert_eq!(view.range_label(), "Mostrando 1 - 5 de 12 Registros");
    }

    #[tokio::test]
    async fn test_refresh_failure_becomes_notice() {
        let api = seeded(3);
        api.fail.set(true);
        let mut view = ExpenseView::new(PageSize::Five);
        assert!(!view.refresh(&api, &spec()).await);
        assert!(view.rows().is_empty());
        let notices = view.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error(ErrorKind::Transport));
        assert!(view.notices().is_empty());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut view = ExpenseView::new(PageSize::Five);
        let older = view.begin_fetch();
        let newer = view.begin_fetch();
        assert!(view.apply_fetch(newer, vec![rec(1, 5.0, "nuevo")]));
        assert!(!view.apply_fetch(older, vec![rec(2, 7.0, "viejo")]));
        assert_eq!(view.rows()[0].description, "nuevo");
    }

    #[test]
    fn test_quick_filter_narrows_total_and_clamps_page() {
        let mut view = ExpenseView::new(PageSize::Five);
        let mut rows: Vec<ExpenseRecord> = (1..=12).map(|i| rec(i, 10.0, "Súper")).collect();
        rows.push(rec(13, 99.5, "Renta"));
        let ticket = view.begin_fetch();
        view.apply_fetch(ticket, rows);
        view.set_page(2);
        assert_eq!(view.pager().page(), 2);

        view.set_quick_filter("renta");
        assert_eq!(view.filtered().len(), 1);
        assert_eq!(view.pager().page(), 0);
        assert_eq!(view.total(), 99.5);

        view.set_quick_filter("");
        assert_eq!(view.filtered().len(), 13);
    }

    #[test]
    fn test_page_size_change_keeps_page_with_rows() {
        let mut view = ExpenseView::new(PageSize::Five);
        let t = view.begin_fetch();
        view.apply_fetch(t, (1..=30).map(|i| rec(i, 1.0, "x")).collect());
        view.set_page(1);
        view.set_page_size(PageSize::Ten);
        assert_eq!(view.pager().page(), 1);
        assert_eq!(view.range_label(), "Mostrando 11 - 20 de 30 Registros");
        view.set_page(2);
        view.set_page_size(PageSize::TwentyFive);
        assert_eq!(view.pager().page(), 0);
    }

    #[test]
    fn test_fetch_shrinking_rows_clamps_page() {
        let mut view = ExpenseView::new(PageSize::Five);
        let t = view.begin_fetch();
        view.apply_fetch(t, (1..=20).map(|i| rec(i, 1.0, "x")).collect());
        view.set_page(3);
        let t = view.begin_fetch();
        view.apply_fetch(t, (1..=6).map(|i| rec(i, 1.0, "x")).collect());
        assert_eq!(view.pager().page(), 1);
        assert_eq!(view.visible_page().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reloads_and_notifies() {
        let api = seeded(3);
        let mut view = ExpenseView::new(PageSize::Five);
        view.refresh(&api, &spec()).await;
        assert!(view.delete(&api, &RecordId::Int(2)).await);
        assert_eq!(api.deletes.get(), 1);
        assert_eq!(api.filters.get(), 2);
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.take_notices(), vec![Notice::success(MSG_DELETED)]);
        assert_eq!(view.delete_state(), &OpState::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_rows() {
        let api = seeded(3);
        let mut view = ExpenseView::new(PageSize::Five);
        view.refresh(&api, &spec()).await;
        api.fail.set(true);
        assert!(!view.delete(&api, &RecordId::Int(2)).await);
        assert_eq!(view.rows().len(), 3);
        assert_eq!(api.filters.get(), 1);
        assert!(matches!(view.delete_state(), OpState::Failed(_)));
        assert_eq!(view.take_notices()[0].level, NoticeLevel::Error(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn test_submit_reloads_on_success() {
        let api = seeded(1);
        let mut view = ExpenseView::new(PageSize::Five);
        view.load_catalog(&api).await;
        view.refresh(&api, &spec()).await;

        let mut editor = RecordEditor::simple();
        *editor.draft_mut() = Draft::Simple(ExpenseDraft {
            amount: "100".into(),
            payment_type: "EF".into(),
            date: "2025-01-10".into(),
            description: "Renta".into(),
        });
        let outcome = view.submit(&mut editor, &api).await;
        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        assert_eq!(api.filters.get(), 2);
        assert_eq!(view.take_notices(), vec![Notice::success(MSG_CREATED)]);
    }

    #[tokio::test]
    async fn test_invalid_submit_adds_no_notice() {
        let api = seeded(1);
        let mut view = ExpenseView::new(PageSize::Five);
        view.load_catalog(&api).await;
        let mut editor = RecordEditor::simple();
        let outcome = view.submit(&mut editor, &api).await;
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(view.notices().is_empty());
        assert_eq!(api.creates.get(), 0);
    }

    #[tokio::test]
    async fn test_export_uses_filtered_rows() {
        let api = seeded(0);
        *api.rows.borrow_mut() = vec![rec(1, 100.0, "Renta"), rec(2, 50.0, "Luz")];
        let mut view = ExpenseView::new(PageSize::Five);
        view.load_catalog(&api).await;
        view.refresh(&api, &spec()).await;
        view.set_quick_filter("renta");

        let table = view.export_table();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][2], "Efectivo");
        assert_eq!(table.total[1], "$ 100.00");
        assert_eq!(table.period, "Enero 2025");

        let dir = tempfile::tempdir().unwrap();
        let sink = export::DirSink::new(dir.path());
        assert!(view.export(ExportKind::Xlsx, &sink, Utc::now()));
        assert_eq!(view.take_notices()[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_export_follows_sort() {
        let api = seeded(0);
        *api.rows.borrow_mut() = vec![rec(1, 50.0, "Luz"), rec(2, 100.0, "Renta"), rec(3, 7.25, "Agua")];
        let mut view = ExpenseView::new(PageSize::Five);
        view.load_catalog(&api).await;
        view.refresh(&api, &spec()).await;
        let unsorted = view.export_table();

        view.set_sort(Some(Sort { column: Column::Amount, order: SortOrder::Ascending }));
        let table = view.export_table();
        let amounts: Vec<&str> = table.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(amounts, vec!["$ 7.25", "$ 50.00", "$ 100.00"]);
        assert_eq!(table.total, unsorted.total);

        view.set_sort(Some(Sort { column: Column::Description, order: SortOrder::Descending }));
        let table = view.export_table();
        let names: Vec<&str> = table.rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(names, vec!["Renta", "Luz", "Agua"]);
        assert_eq!(view.visible_page()[0].description, "Renta");

        view.set_sort(None);
        assert_eq!(view.export_table(), unsorted);
    }

    struct BrokenSink;

    impl ArtifactSink for BrokenSink {
        fn save(&self, _filename: &str, _bytes: &[u8]) -> crate::error::Result<std::path::PathBuf> {
            Err(std::io::Error::other("read-only").into())
        }
    }

    #[test]
    fn test_export_failure_becomes_notice() {
        let mut view = ExpenseView::new(PageSize::Five);
        assert!(!view.export(ExportKind::Pdf, &BrokenSink, Utc::now()));
        let notices = view.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error(ErrorKind::Serialization));
        assert!(notices[0].message.contains("PDF"));
    }
}
