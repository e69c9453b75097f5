//! Generated bindings for the input trigger protocols

pub mod registration {
    use wayland_client;

    pub mod __interfaces {
        use wayland_client::backend as wayland_backend;
        wayland_scanner::generate_interfaces!("protocols/ext-input-trigger-registration-v1.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocols/ext-input-trigger-registration-v1.xml");
}

pub mod action {
    use wayland_client;

    pub mod __interfaces {
        use wayland_client::backend as wayland_backend;
        wayland_scanner::generate_interfaces!("protocols/ext-input-trigger-action-v1.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocols/ext-input-trigger-action-v1.xml");
}

pub use action::ext_input_trigger_action_manager_v1::ExtInputTriggerActionManagerV1;
pub use action::ext_input_trigger_action_v1::{self, ExtInputTriggerActionV1};
pub use registration::ext_input_trigger_action_control_v1::{
    self, ExtInputTriggerActionControlV1,
};
pub use registration::ext_input_trigger_registration_manager_v1::ExtInputTriggerRegistrationManagerV1;
pub use registration::ext_input_trigger_v1::{self, ExtInputTriggerV1};
