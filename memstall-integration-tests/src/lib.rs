//! No library code; the workspace-level scenarios live in `tests/`.
