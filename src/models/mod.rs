// Data models for launch plans

pub mod launch_plan;
