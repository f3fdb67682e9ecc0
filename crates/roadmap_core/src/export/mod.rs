//! Tabular exports of project data.

pub mod gantt;
