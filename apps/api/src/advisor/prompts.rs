// Prompt text for the career advisor. The model is asked for Markdown so the
// answer can be shown and exported as-is.

use crate::advisor::AdvisoryRequest;

const ADVISOR_PREAMBLE: &str = "You are an AI Career Advisor. Based on the following user profile:";

const ADVISOR_INSTRUCTIONS: &str = "\
Provide personalized career path recommendations in **Markdown format**.
Make sure to include these sections:
1. **Recommended Career Paths** (with explanation)
2. **Skills to Learn / Improve**
3. **Learning Resources** (courses, platforms, tools)
4. **Next Steps / Roadmap**

Keep it clear, motivational, and beginner-friendly.";

/// The structured fields restated as plain lines; used as the user input
/// for a recommendation request.
pub fn profile_summary(req: &AdvisoryRequest) -> String {
    format!(
        "Education: {}\nSkills: {}\nInterests: {}\nGoal: {}",
        req.education, req.skills, req.interests, req.goal
    )
}

pub fn build_advisor_prompt(user_input: &str, req: &AdvisoryRequest) -> String {
    format!(
        "{ADVISOR_PREAMBLE}\n\n\
         🎓 Education: {}\n\
         🛠 Skills: {}\n\
         💡 Interests: {}\n\
         🏆 Career Goal: {}\n\n\
         {ADVISOR_INSTRUCTIONS}\n\
         ----\n\
         User Input: {user_input}",
        req.education, req.skills, req.interests, req.goal
    )
}
