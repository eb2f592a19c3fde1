pub mod gemini;
pub mod planner;
pub mod profiles;
pub mod recommender;
pub mod storage;
pub mod trips;
