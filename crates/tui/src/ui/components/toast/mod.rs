mod state;
mod toast_component;

pub use state::ToastState;
pub use toast_component::ToastComponent;
