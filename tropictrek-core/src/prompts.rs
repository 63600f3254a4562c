/// Example prompt shown in the empty-conversation gallery.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PromptCard {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub const PROMPT_GALLERY: &[PromptCard] = &[
    PromptCard {
        title: "Nature Isle escape",
        prompt: "Plan a 3-day trip to Dominica with hiking and waterfalls",
    },
    PromptCard {
        title: "Spice Isle beaches",
        prompt: "What are the best beaches in Grenada for snorkeling?",
    },
    PromptCard {
        title: "Island hopping",
        prompt: "Create a 7-day island hopping itinerary for St. Kitts and Nevis and Antigua",
    },
    PromptCard {
        title: "Pitons and culture",
        prompt: "Show me pictures of the Pitons in Saint Lucia",
    },
    PromptCard {
        title: "Budget sailing",
        prompt: "Suggest a budget-friendly sailing week in St. Vincent and the Grenadines",
    },
    PromptCard {
        title: "Local cuisine",
        prompt: "Which local dishes should I try in Antigua and Barbuda?",
    },
];
