use crate::{
    data::student::{Student, StudentDraft},
    error::{CsvSnafu, ExportCsvSnafu, MultipartSnafu, RosterResult},
    maud_conveniences::{NoticeKind, Palette, notice, render_table, subtitle},
    state::RosterState,
    validation::validate_draft,
};
use axum::{
    extract::{Multipart, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Deserialize)]
struct CsvStudent {
    roll_no: String,
    name: String,
    age: String,
    city: String,
}

impl From<CsvStudent> for StudentDraft {
    fn from(
        CsvStudent {
            roll_no,
            name,
            age,
            city,
        }: CsvStudent,
    ) -> Self {
        Self {
            roll_no,
            name,
            age,
            city,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImportProblem {
    pub file: String,
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub drafts: Vec<StudentDraft>,
    pub problems: Vec<ImportProblem>,
}

impl ParsedImport {
    /// Reads one CSV upload. Rows that would be refused at the keyboard are refused here too.
    pub fn add_csv(&mut self, file: &str, bytes: &[u8]) -> RosterResult<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);
        let headers = rdr.headers().context(CsvSnafu)?.clone();

        for record in rdr.records() {
            let problem = |line, message| ImportProblem {
                file: file.to_string(),
                line,
                message,
            };

            let record = match record {
                Ok(x) => x,
                Err(e) => {
                    let line = e.position().map_or(0, csv::Position::line);
                    self.problems.push(problem(line, e.to_string()));
                    continue;
                }
            };
            let line = record.position().map_or(0, csv::Position::line);

            let row: CsvStudent = match record.deserialize(Some(&headers)) {
                Ok(x) => x,
                Err(e) => {
                    self.problems.push(problem(line, e.to_string()));
                    continue;
                }
            };

            match validate_draft(&row.into()) {
                Ok(draft) => self.drafts.push(draft),
                Err(errors) => {
                    let message = errors
                        .iter()
                        .map(|(field, reason)| format!("{}: {reason}", field.label()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.problems.push(problem(line, message));
                }
            }
        }

        Ok(())
    }
}

pub fn render_import_panel(palette: Palette) -> Markup {
    html! {
        div class={"rounded-xl shadow-lg p-4 sm:p-6 mt-6 sm:mt-8 " (palette.panel)} {
            (subtitle(palette, "Import Students"))

            div id="import_students_form" {
                (render_table(
                    palette,
                    ["Column", "Example"],
                    vec![
                        [html!{"roll_no"}, html!{"A101"}],
                        [html!{"name"}, html!{"Ravi"}],
                        [html!{"age"}, html!{"20"}],
                        [html!{"city"}, html!{"Delhi"}],
                    ]
                ))

                br;

                form hx-put="/import" hx-swap="innerHTML" hx-target="#import_students_form" hx-encoding="multipart/form-data" {
                    label for="students_csv" class={"block text-sm font-medium mb-2 " (palette.muted)} {"Upload Students CSV"}
                    input multiple type="file" name="students_csv" id="students_csv" accept=".csv" class={"block w-full text-sm mb-4 " (palette.text)};

                    button type="submit" class="bg-blue-600 hover:bg-blue-700 text-white font-semibold px-6 py-2 rounded-xl" {
                        "Import Students"
                    }
                }
            }
        }
    }
}

fn render_import_result(parsed: &ParsedImport, outcome: &RosterResult<usize>) -> Markup {
    html! {
        @match outcome {
            Ok(0) => {
                (notice(NoticeKind::Warning, "Nothing was imported."))
            }
            Ok(count) => {
                (notice(NoticeKind::Success, format!("Imported {count} student(s).")))
            }
            Err(e) => {
                (notice(NoticeKind::Problem, e.to_string()))
            }
        }

        @if !parsed.problems.is_empty() {
            p class="font-semibold mb-2" {"Skipped rows:"}
            ul class="list-disc pl-6 text-sm" {
                @for problem in &parsed.problems {
                    li {(problem.file) " line " (problem.line) ": " (problem.message)}
                }
            }
        }

        a href="/" class="underline text-sm" {"Import more"}
    }
}

pub async fn put_import_students(
    State(state): State<RosterState>,
    mut multipart: Multipart,
) -> RosterResult<Response> {
    let mut parsed = ParsedImport::default();
    loop {
        let Some(field) = multipart.next_field().await.context(MultipartSnafu)? else {
            break;
        };

        let file = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.context(MultipartSnafu)?;
        parsed.add_csv(&file, bytes.as_ref())?;
    }

    let outcome = state.roster().import(&parsed.drafts).await;
    let markup = render_import_result(&parsed, &outcome);

    Ok(if matches!(outcome, Ok(count) if count > 0) {
        ([("HX-Trigger", "roster-changed")], markup).into_response()
    } else {
        markup.into_response()
    })
}

pub fn students_to_csv(students: &[Student]) -> RosterResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for student in students {
        writer.serialize(student).context(CsvSnafu)?;
    }
    writer
        .into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .context(ExportCsvSnafu)
}

pub async fn get_export_students(State(state): State<RosterState>) -> RosterResult<Response> {
    let view = state.roster().view().await;
    let body = students_to_csv(&view.roster)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"students.csv\""),
        ],
        body,
    )
        .into_response())
}
