pub mod actor_critic;
pub mod conv_stack;
pub mod recurrent;
