pub mod draft_panel;
pub mod queue_header;
pub mod queue_list;
