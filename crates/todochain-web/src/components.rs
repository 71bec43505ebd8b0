mod new_task_form;
mod notice_stack;
mod task_row;

pub use new_task_form::NewTaskForm;
pub use notice_stack::NoticeStack;
pub use task_row::TaskRow;
